use chrono::{DateTime, Local, TimeZone, Timelike, Utc};
use serde::Serialize;

use crate::color::{color_for_processor, HslaColor};
use crate::window::ProcessorSeries;

const LINE_TENSION: f64 = 0.4;
const FILL_ALPHA: f64 = 0.2;

/// Chart-ready projection of one processor's window.
///
/// `labels` and `points` are parallel and follow the window's order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub processor: String,
    pub label: String,
    pub labels: Vec<String>,
    /// Latency in milliseconds
    pub points: Vec<f64>,
    pub border_color: HslaColor,
    pub background_color: HslaColor,
    pub tension: f64,
}

impl ChartSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// `H:M:S.ms` without zero padding, e.g. `9:5:3.42`.
pub fn format_sample_label<Tz: TimeZone>(time: &DateTime<Tz>) -> String {
    format!(
        "{}:{}:{}.{}",
        time.hour(),
        time.minute(),
        time.second(),
        (time.nanosecond() / 1_000_000) % 1000
    )
}

fn local_label(timestamp_millis: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(timestamp_millis) {
        Some(utc) => format_sample_label(&utc.with_timezone(&Local)),
        None => String::new(),
    }
}

/// Build the chart series for a window, labelling samples in local time.
pub fn chart_series(series: &ProcessorSeries) -> ChartSeries {
    chart_series_with(series, local_label)
}

/// Build the chart series with a caller-supplied label formatter.
pub fn chart_series_with<F>(series: &ProcessorSeries, label_for: F) -> ChartSeries
where
    F: Fn(i64) -> String,
{
    let (labels, points) = series
        .samples
        .iter()
        .map(|sample| {
            (
                label_for(sample.timestamp_millis),
                sample.value_seconds * 1000.0,
            )
        })
        .unzip();

    ChartSeries {
        processor: series.processor.clone(),
        label: format!("TTFB ({})", series.processor),
        labels,
        points,
        border_color: color_for_processor(&series.processor, 1.0),
        background_color: color_for_processor(&series.processor, FILL_ALPHA),
        tension: LINE_TENSION,
    }
}
