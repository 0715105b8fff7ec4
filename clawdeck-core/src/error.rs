//! Error types for clawdeck-core

use thiserror::Error;

/// Main error type for the clawdeck-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Explicit store database error
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Caller-supplied query parameter was rejected
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Gateway request failed
    #[error("gateway error: {0}")]
    Gateway(String),
}

/// Result type alias for clawdeck-core
pub type Result<T> = std::result::Result<T, Error>;
