//! Error types for the GDI workspace.

use thiserror::Error;

/// Result type alias using the GDI error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for GDI consumers.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input data (e.g. a table missing required columns)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create an error with additional context.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Check if this error must halt the calling pipeline.
    ///
    /// Malformed input and invalid configuration values are fatal. IO and
    /// parse failures are reported and the caller may fall back to defaults.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::InvalidInput(_) | Self::Config(_) => true,
            Self::WithContext { source, .. } => source.is_fatal(),
            Self::Io(_) | Self::Json(_) => false,
        }
    }

    /// Check if this is an invalid-input error.
    pub fn is_invalid_input(&self) -> bool {
        match self {
            Self::InvalidInput(_) => true,
            Self::WithContext { source, .. } => source.is_invalid_input(),
            _ => false,
        }
    }
}

/// Extension trait for adding context to any error type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }
}
