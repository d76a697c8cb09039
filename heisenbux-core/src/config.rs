//! Runtime configuration.
//!
//! Every path and cosmetic value the store and renderer use lives here, so
//! tests can point them at a scratch directory instead of the working
//! directory. All keys are optional in TOML; missing ones take the defaults
//! below.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CACHE_DIR: &str = "cache";
pub const DEFAULT_GRAPHS_DIR: &str = "graphs";
pub const DEFAULT_LOOKBACK_DAYS: u32 = 365;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeisenbuxConfig {
    /// Directory holding one `<TICKER>.csv` per cached ticker.
    pub cache_dir: PathBuf,
    /// Directory the renderer writes charts into.
    pub graphs_dir: PathBuf,
    /// Calendar days of history requested on a cache miss.
    pub lookback_days: u32,
    pub chart: ChartConfig,
}

impl Default for HeisenbuxConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            graphs_dir: PathBuf::from(DEFAULT_GRAPHS_DIR),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            chart: ChartConfig::default(),
        }
    }
}

impl HeisenbuxConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.lookback_days == 0 {
            return Err(ConfigError::Invalid("lookback_days must be at least 1".into()));
        }
        if self.chart.width_inches <= 0.0 || self.chart.height_inches <= 0.0 {
            return Err(ConfigError::Invalid("chart size must be positive".into()));
        }
        if self.chart.dpi == 0 {
            return Err(ConfigError::Invalid("chart dpi must be at least 1".into()));
        }
        Ok(())
    }
}

/// Chart cosmetics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChartConfig {
    pub width_inches: f64,
    pub height_inches: f64,
    pub dpi: u32,
    /// Appended to the uppercased ticker to form the chart title.
    pub title_suffix: String,
    pub x_axis_label: String,
    pub y_axis_label: String,
    pub series_label: String,
    /// Turn the date labels on the x axis so long ranges stay legible.
    pub rotate_x_labels: bool,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width_inches: 12.0,
            height_inches: 6.0,
            dpi: 100,
            title_suffix: " Closing Prices (Last Year)".into(),
            x_axis_label: "Date".into(),
            y_axis_label: "Price (USD)".into(),
            series_label: "Closing Price".into(),
            rotate_x_labels: true,
        }
    }
}

impl ChartConfig {
    /// Canvas size in pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        let dpi = f64::from(self.dpi);
        (
            (self.width_inches * dpi).round() as u32,
            (self.height_inches * dpi).round() as u32,
        )
    }

    pub fn title(&self, ticker: &str) -> String {
        format!("{}{}", ticker.to_uppercase(), self.title_suffix)
    }
}
