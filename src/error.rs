//! Error types for Argus
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in Argus
#[derive(Debug, Error)]
pub enum ArgusError {
    /// Inference returned an action outside the closed set.
    /// Fatal to the current run only, never to the batch.
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Inference output could not be parsed into the expected schema
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Transient service failure (network, rate limit, 5xx)
    #[error("Transient service error: {0}")]
    Transient(String),

    /// Imagery capture failure
    #[error("Imaging error: {0}")]
    Imaging(String),

    /// Registry write/read failure. Fatal to the batch.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Aggregation requested over zero step results
    #[error("Cannot aggregate an empty run")]
    EmptyInput,

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV ingestion error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ArgusError {
    /// Returns true if the call that produced this error may be retried in place.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ArgusError::Transient(_) | ArgusError::MalformedResponse(_)
        )
    }
}

/// Result type alias for Argus operations
pub type Result<T> = std::result::Result<T, ArgusError>;
