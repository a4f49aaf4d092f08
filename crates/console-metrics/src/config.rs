use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::aggregator::AggregatorConfig;
use crate::error::MetricsResult;
use crate::panel::InfoPanelOptions;

pub const DEFAULT_BUS_CAPACITY: usize = 256;

/// Console settings, usually read from a TOML file.
///
/// ```toml
/// bus_capacity = 512
///
/// [metrics]
/// ignore_processor_names = ["SileroVADAnalyzer#0"]
/// no_total_tokens = true
///
/// [info_panel]
/// no_user_video = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub bus_capacity: usize,
    pub metrics: AggregatorConfig,
    pub info_panel: InfoPanelOptions,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            bus_capacity: DEFAULT_BUS_CAPACITY,
            metrics: AggregatorConfig::default(),
            info_panel: InfoPanelOptions::default(),
        }
    }
}

impl ConsoleConfig {
    pub fn from_toml_str(content: &str) -> MetricsResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> MetricsResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }
}
