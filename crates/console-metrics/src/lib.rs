pub mod aggregator;
pub mod bus;
pub mod chart;
pub mod color;
pub mod config;
pub mod error;
pub mod events;
pub mod panel;
pub mod types;
pub mod window;
pub mod worker;

pub use aggregator::{AggregatorConfig, MetricsAggregator, MetricsSnapshot};
pub use bus::MetricsBus;
pub use chart::{chart_series, format_sample_label, ChartSeries};
pub use color::{color_for_processor, HslaColor};
pub use config::ConsoleConfig;
pub use error::{MetricsError, MetricsResult};
pub use events::{ConsoleEvent, MetricsPayload, ProcessingMetric, TokenRecord};
pub use panel::{DeviceControl, InfoPanelOptions, PanelSection};
pub use types::{ConnectionState, Sample, TokenField, TokenUsage, ViewState};
pub use window::{ProcessorSeries, SampleWindow, SERIES_WINDOW};
pub use worker::{SessionWorker, SessionWorkerHandle, WorkerSummary};
