//! Error types for the analytics pipeline.
//!
//! Only schema violations are errors. Malformed rows are dropped and counted
//! in an [`IngestReport`](crate::record::IngestReport), and queries that match
//! nothing return empty results.

use thiserror::Error;

use gdi_common::ValidationError;

/// Result type alias for analytics operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Analytics pipeline error.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Required column(s) absent from the ingested table. Fatal.
    #[error("Schema error: missing required column(s): {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    /// Analytics configuration failed validation.
    #[error("Invalid analytics configuration: {0}")]
    InvalidConfig(#[from] ValidationError),
}

impl From<AnalyticsError> for gdi_common::Error {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::Schema { .. } => Self::InvalidInput(err.to_string()),
            AnalyticsError::InvalidConfig(_) => Self::Config(err.to_string()),
        }
    }
}
