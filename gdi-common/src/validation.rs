//! Configuration validation.
//!
//! Checks that configuration values are within valid ranges before any
//! consumer starts using them.

use thiserror::Error;

use crate::config::{AnalyticsConfig, Config, ObservabilityConfig};

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

impl Config {
    /// Validate the entire configuration.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = self.observability.validate() {
            errors.push(e);
        }

        if let Err(e) = self.analytics.validate() {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else if errors.len() == 1 {
            Err(errors.remove(0))
        } else {
            Err(ValidationError::Multiple(errors))
        }
    }

    /// Load (with environment overrides) and validate configuration.
    pub fn load_and_validate() -> crate::Result<Self> {
        let config = Self::load_with_env()?;
        config
            .validate()
            .map_err(|e| crate::Error::Config(e.to_string()))?;
        Ok(config)
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_level".into(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            });
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.log_format.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_format".into(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            });
        }

        Ok(())
    }
}

impl Validate for AnalyticsConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.rank_change_top_n == 0 {
            return Err(ValidationError::InvalidValue {
                field: "analytics.rank_change_top_n".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.default_home_country.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "analytics.default_home_country".into(),
            });
        }

        if let Some(blank) = self
            .default_comparison_countries
            .iter()
            .position(|c| c.trim().is_empty())
        {
            return Err(ValidationError::InvalidValue {
                field: format!("analytics.default_comparison_countries[{}]", blank),
                reason: "country name must not be empty".into(),
            });
        }

        Ok(())
    }
}
