use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chart::{chart_series, ChartSeries};
use crate::error::{MetricsError, MetricsResult};
use crate::events::{MetricsPayload, TokenRecord};
use crate::types::{ConnectionState, Sample, TokenField, TokenUsage, ViewState};
use crate::window::ProcessorSeries;

/// Fixed settings for an aggregator instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Processors whose samples are dropped
    pub ignore_processor_names: HashSet<String>,
    pub no_prompt_tokens: bool,
    pub no_completion_tokens: bool,
    pub no_total_tokens: bool,
}

impl AggregatorConfig {
    pub fn ignoring<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ignore_processor_names: names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn is_suppressed(&self, field: TokenField) -> bool {
        match field {
            TokenField::Prompt => self.no_prompt_tokens,
            TokenField::Completion => self.no_completion_tokens,
            TokenField::Total => self.no_total_tokens,
        }
    }

    /// Token cards to display, in display order.
    pub fn visible_token_fields(&self) -> Vec<TokenField> {
        TokenField::ALL
            .into_iter()
            .filter(|field| !self.is_suppressed(*field))
            .collect()
    }

    fn masked(&self, record: TokenRecord) -> TokenUsage {
        let mask = |field: TokenField, value: u64| {
            if self.is_suppressed(field) {
                0
            } else {
                value
            }
        };
        TokenUsage {
            completion_tokens: mask(TokenField::Completion, record.completion_tokens),
            prompt_tokens: mask(TokenField::Prompt, record.prompt_tokens),
            total_tokens: mask(TokenField::Total, record.total_tokens),
        }
    }
}

/// Live per-session metrics: latency windows per processor and token totals.
///
/// State is reset by [`on_session_connected`](Self::on_session_connected) and
/// accumulates until the next reset.
#[derive(Debug, Clone)]
pub struct MetricsAggregator {
    config: AggregatorConfig,
    series: Vec<ProcessorSeries>,
    totals: Option<TokenUsage>,
}

impl MetricsAggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self {
            config,
            series: Vec::new(),
            totals: None,
        }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    pub fn on_session_connected(&mut self) {
        self.series.clear();
        self.totals = Some(TokenUsage::default());
    }

    pub fn on_metrics_event(&mut self, payload: &MetricsPayload) -> MetricsResult<()> {
        self.on_metrics_event_at(payload, Utc::now())
    }

    /// Apply a metrics event received at `received_at`.
    ///
    /// An event carrying token usage before the first connected signal is
    /// rejected whole, leaving the state untouched.
    pub fn on_metrics_event_at(
        &mut self,
        payload: &MetricsPayload,
        received_at: DateTime<Utc>,
    ) -> MetricsResult<()> {
        if payload.token_record.is_some() && self.totals.is_none() {
            return Err(MetricsError::SessionNotConnected);
        }

        let timestamp_millis = received_at.timestamp_millis();
        for entry in &payload.processing {
            if self.config.ignore_processor_names.contains(&entry.processor) {
                continue;
            }

            let evicted = self.series_mut(&entry.processor).samples.push(Sample {
                processor: entry.processor.clone(),
                timestamp_millis,
                value_seconds: entry.value,
            });
            if evicted > 0 {
                log::trace!("evicted {} sample(s) for {}", evicted, entry.processor);
            }
        }

        if let (Some(record), Some(totals)) = (payload.token_record, self.totals.as_mut()) {
            totals.add_assign(self.config.masked(record));
        }

        Ok(())
    }

    fn series_mut(&mut self, processor: &str) -> &mut ProcessorSeries {
        let index = match self.series.iter().position(|s| s.processor == processor) {
            Some(index) => index,
            None => {
                self.series.push(ProcessorSeries::new(processor));
                self.series.len() - 1
            }
        };
        &mut self.series[index]
    }

    /// Series in the order processors were first seen this session.
    pub fn series(&self) -> &[ProcessorSeries] {
        &self.series
    }

    pub fn series_for(&self, processor: &str) -> Option<&ProcessorSeries> {
        self.series.iter().find(|s| s.processor == processor)
    }

    pub fn totals(&self) -> Option<TokenUsage> {
        self.totals
    }

    pub fn has_data(&self) -> bool {
        !self.series.is_empty() || self.totals.is_some()
    }

    pub fn chart_series(&self, processor: &str) -> Option<ChartSeries> {
        self.series_for(processor).map(chart_series)
    }

    pub fn view_state(&self, connection: &ConnectionState) -> ViewState {
        ViewState::classify(connection, self.has_data())
    }

    pub fn snapshot(&self, connection: &ConnectionState) -> MetricsSnapshot {
        MetricsSnapshot {
            connection: connection.clone(),
            view: self.view_state(connection),
            totals: self.totals,
            visible_token_fields: self.config.visible_token_fields(),
            series: self.series.clone(),
            charts: self.series.iter().map(chart_series).collect(),
        }
    }
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new(AggregatorConfig::default())
    }
}

/// Point-in-time copy of the aggregator for renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub connection: ConnectionState,
    pub view: ViewState,
    pub totals: Option<TokenUsage>,
    pub visible_token_fields: Vec<TokenField>,
    pub series: Vec<ProcessorSeries>,
    pub charts: Vec<ChartSeries>,
}
