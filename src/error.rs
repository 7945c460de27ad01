//! Focus Filter error types

use thiserror::Error;

/// Focus Filter error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (e.g. missing model credential outside offline mode)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed input rejected at construction
    #[error("Validation error: {0}")]
    Validation(String),

    /// Classification stage failure
    #[error("Classification error: {0}")]
    Classification(String),

    /// Fact extraction stage failure
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// External model call failure
    #[error("Model error: {0}")]
    Model(String),

    /// Persistence error
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Focus Filter operations
pub type Result<T> = std::result::Result<T, Error>;
