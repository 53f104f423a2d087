//! Configuration management for GDI consumers.
//!
//! Configuration lives in a single file at `~/.gdi/config.json`. Every field
//! has a default, so a missing file or a partial file is valid.
//!
//! # Configuration Priority
//!
//! 1. Environment variables (GDI_* prefix)
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `GDI_LOG_LEVEL` → observability.log_level
//! - `GDI_LOG_FORMAT` → observability.log_format
//! - `GDI_CACHE_CAPACITY` → analytics.cache_capacity
//! - `GDI_TREND_EXCLUDED_YEARS` → analytics.trend_excluded_years (comma separated)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, ResultExt};

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new()
        .map_or_else(|| PathBuf::from(".gdi"), |dirs| dirs.home_dir().join(".gdi"))
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration shared by every GDI consumer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Analytics pipeline configuration
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// Returns defaults when the file does not exist.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::info!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .context(format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration with environment variable overrides applied.
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Save configuration to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context(format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .context(format!("Failed to write config to {}", path.display()))
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("GDI_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Ok(format) = std::env::var("GDI_LOG_FORMAT") {
            self.observability.log_format = format;
        }
        if let Ok(capacity) = std::env::var("GDI_CACHE_CAPACITY") {
            if let Ok(c) = capacity.parse() {
                self.analytics.cache_capacity = c;
            }
        }
        if let Ok(years) = std::env::var("GDI_TREND_EXCLUDED_YEARS") {
            match parse_year_list(&years) {
                Some(parsed) => self.analytics.trend_excluded_years = parsed,
                None => tracing::warn!(
                    value = %years,
                    "Ignoring unparseable GDI_TREND_EXCLUDED_YEARS"
                ),
            }
        }
    }
}

/// Parse a comma separated list of years. Empty input yields an empty list.
pub fn parse_year_list(raw: &str) -> Option<Vec<i32>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
        .collect()
}

// ============================================================================
// Observability Configuration
// ============================================================================

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,

    /// Additional module targets to set to `warn`.
    #[serde(default)]
    pub excluded_targets: Vec<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            excluded_targets: Vec::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

// ============================================================================
// Analytics Configuration
// ============================================================================

/// Analytics pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Years dropped from trend series (2019 is a known data-quality gap).
    #[serde(default = "default_trend_excluded_years")]
    pub trend_excluded_years: Vec<i32>,

    /// Length of the "most improved" / "biggest fall" lists.
    #[serde(default = "default_rank_change_top_n")]
    pub rank_change_top_n: usize,

    /// Countries pre-selected for multi-country comparison.
    #[serde(default = "default_comparison_countries")]
    pub default_comparison_countries: Vec<String>,

    /// Country pre-selected for the network footprint view.
    #[serde(default = "default_home_country")]
    pub default_home_country: String,

    /// Memoized entries kept per query kind. `0` disables memoization.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            trend_excluded_years: default_trend_excluded_years(),
            rank_change_top_n: default_rank_change_top_n(),
            default_comparison_countries: default_comparison_countries(),
            default_home_country: default_home_country(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

fn default_trend_excluded_years() -> Vec<i32> {
    vec![2019]
}

fn default_rank_change_top_n() -> usize {
    10
}

fn default_comparison_countries() -> Vec<String> {
    ["China", "United States", "Turkey", "Japan", "France", "Russia"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_home_country() -> String {
    "China".into()
}

fn default_cache_capacity() -> usize {
    256
}
