//! Configuration management for the templating engine
//!
//! This module provides configuration file support with TOML format,
//! environment variable overrides, and sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result, ValidationError};
use crate::query::interval::parse_interval;
use crate::template::format::MultiValueFormat;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Interval quantization settings
    #[serde(default)]
    pub interval: IntervalConfig,

    /// Token interpolation settings
    #[serde(default)]
    pub interpolation: InterpolationConfig,

    /// Multi-value variable handling
    #[serde(default)]
    pub multi_value: MultiValueConfig,
}

/// Interval quantization configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct IntervalConfig {
    /// Floor applied when a datasource declares none (e.g. "15s")
    #[serde(default = "default_min_interval")]
    pub default_min_interval: String,

    /// Resolution used when a request carries no pixel width
    #[serde(default = "default_max_data_points")]
    pub default_max_data_points: u32,

    /// Upper bound of points a single query may return
    #[serde(default = "default_max_points_per_query")]
    pub max_points_per_query: u32,

    /// Scrape interval used for `$__rate_interval` when none is known
    #[serde(default = "default_scrape_interval")]
    pub default_scrape_interval: String,
}

/// Token interpolation configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct InterpolationConfig {
    /// Log tokens that stay unresolved after interpolation
    #[serde(default)]
    pub warn_on_unresolved: bool,

    /// CSS class used by `highlight_variables_as_html`
    #[serde(default = "default_highlight_class")]
    pub highlight_class: String,
}

/// Multi-value variable configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MultiValueConfig {
    /// How list selections are joined before substitution
    #[serde(default)]
    pub format: MultiValueFormat,
}

// Default value functions
fn default_min_interval() -> String { "15s".to_string() }
fn default_max_data_points() -> u32 { 1_000 }
fn default_max_points_per_query() -> u32 { 11_000 }
fn default_scrape_interval() -> String { "15s".to_string() }
fn default_highlight_class() -> String { "template-variable".to_string() }

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            default_min_interval: default_min_interval(),
            default_max_data_points: default_max_data_points(),
            max_points_per_query: default_max_points_per_query(),
            default_scrape_interval: default_scrape_interval(),
        }
    }
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            warn_on_unresolved: false,
            highlight_class: default_highlight_class(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        toml::from_str(&contents).map_err(|e| {
            Error::Configuration(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Load configuration with environment variable overrides
    pub fn from_file_with_env(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from environment variables only
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Apply environment variable overrides
    ///
    /// Unparseable numeric values are ignored and the previous value kept.
    pub fn apply_env_overrides(&mut self) {
        // Interval
        if let Ok(min_interval) = std::env::var("TEMPLATING_MIN_INTERVAL") {
            self.interval.default_min_interval = min_interval;
        }
        if let Ok(points) = std::env::var("TEMPLATING_MAX_DATA_POINTS") {
            if let Ok(p) = points.parse() {
                self.interval.default_max_data_points = p;
            }
        }
        if let Ok(points) = std::env::var("TEMPLATING_MAX_POINTS_PER_QUERY") {
            if let Ok(p) = points.parse() {
                self.interval.max_points_per_query = p;
            }
        }
        if let Ok(scrape) = std::env::var("TEMPLATING_SCRAPE_INTERVAL") {
            self.interval.default_scrape_interval = scrape;
        }

        // Interpolation
        if let Ok(warn) = std::env::var("TEMPLATING_WARN_ON_UNRESOLVED") {
            if let Ok(w) = warn.parse() {
                self.interpolation.warn_on_unresolved = w;
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("interval.default_min_interval", &self.interval.default_min_interval),
            ("interval.default_scrape_interval", &self.interval.default_scrape_interval),
        ] {
            if let Err(e) = parse_interval(value) {
                return Err(ValidationError::InvalidFormat {
                    field: field.to_string(),
                    message: e.to_string(),
                }
                .into());
            }
        }

        if self.interval.default_max_data_points == 0 {
            return Err(ValidationError::OutOfRange {
                field: "interval.default_max_data_points".to_string(),
                value: "0".to_string(),
                min: "1".to_string(),
                max: u32::MAX.to_string(),
            }
            .into());
        }
        if self.interval.max_points_per_query == 0 {
            return Err(ValidationError::OutOfRange {
                field: "interval.max_points_per_query".to_string(),
                value: "0".to_string(),
                min: "1".to_string(),
                max: u32::MAX.to_string(),
            }
            .into());
        }

        if self.interpolation.highlight_class.trim().is_empty() {
            return Err(ValidationError::InvalidFormat {
                field: "interpolation.highlight_class".to_string(),
                message: "must not be empty".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Save configuration to TOML file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Serialization(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)?;
        Ok(())
    }
}
