//! Dashboard configuration, read from YAML. Every field is optional; missing
//! ones take the Superstore dashboard defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dashboard::display::DisplayConfig;
use crate::processor::LoadOptions;
use crate::processor::AggregateOp;
use crate::processor::ranking::TOP_N;
use crate::processor::year_filter::{YearOptions, YearSelection};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// CSV file to load.
    pub dataset: PathBuf,
    /// Length of both product rankings.
    pub top_n: usize,
    /// Initial year selection; unset means the sidebar default.
    pub default_year: Option<YearSelection>,
    /// Per-product aggregation used to rank products.
    pub ranking_op: AggregateOp,
    /// Half-width added around a gauge whose min equals its max.
    pub gauge_padding: f64,
    pub load: LoadOptions,
    pub display: DisplayConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            dataset: PathBuf::from("superstore_data.csv"),
            top_n: TOP_N,
            default_year: None,
            ranking_op: AggregateOp::Max,
            gauge_padding: 1.0,
            load: LoadOptions::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl DashboardConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to a struct.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: DashboardConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_n == 0 {
            return Err(ConfigError::Invalid("top_n must be at least 1".into()));
        }
        if !(self.gauge_padding.is_finite() && self.gauge_padding > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "gauge_padding must be a positive number, got {}",
                self.gauge_padding
            )));
        }
        Ok(())
    }

    /// Selection for a render pass: an explicit choice wins, then the
    /// configured default, then the sidebar default.
    pub fn resolve_selection(
        &self,
        options: &YearOptions,
        requested: Option<YearSelection>,
    ) -> YearSelection {
        requested
            .or(self.default_year)
            .unwrap_or_else(|| options.default_selection())
    }
}
