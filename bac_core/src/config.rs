//! Configuration file support for bacdash.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/bacdash/config.toml`.

use crate::curve::DEFAULT_SAMPLES;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub chart: ChartConfig,
}

/// Values used when an input is not given on the command line
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_weight_lbs")]
    pub weight_lbs: f64,

    #[serde(default = "default_sex")]
    pub sex: String,

    #[serde(default = "default_metabolism_rate")]
    pub metabolism_rate: f64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            weight_lbs: default_weight_lbs(),
            sex: default_sex(),
            metabolism_rate: default_metabolism_rate(),
        }
    }
}

/// Chart rendering configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default = "default_samples")]
    pub samples: usize,

    /// Plot the curve with the fixed 0.015 slope instead of the metabolism rate
    #[serde(default)]
    pub legacy_display_slope: bool,

    /// TrueType font for titles and labels; common system fonts are probed when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            samples: default_samples(),
            legacy_display_slope: false,
            font_path: None,
        }
    }
}

// Default value functions
fn default_weight_lbs() -> f64 {
    160.0
}

fn default_sex() -> String {
    "male".into()
}

fn default_metabolism_rate() -> f64 {
    0.015
}

fn default_width() -> u32 {
    600
}

fn default_height() -> u32 {
    300
}

fn default_samples() -> usize {
    DEFAULT_SAMPLES
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        match Self::default_config_path() {
            Some(config_path) if config_path.exists() => Self::load_from(&config_path),
            config_path => {
                tracing::info!(
                    "No config file found at {:?}, using defaults",
                    config_path
                );
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    ///
    /// Returns `None` on platforms without a known config directory.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|base| base.join("bacdash").join("config.toml"))
    }

    /// Reject values the renderer cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.chart.width < 100 || self.chart.height < 100 {
            return Err(Error::Config(format!(
                "chart must be at least 100x100 pixels, got {}x{}",
                self.chart.width, self.chart.height
            )));
        }
        if self.chart.samples < 2 {
            return Err(Error::Config(format!(
                "chart.samples must be at least 2, got {}",
                self.chart.samples
            )));
        }
        Ok(())
    }

    /// Serialize to pretty TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, self.to_toml_string()?)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
