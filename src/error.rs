//! Error handling module for oppboard
//!
//! The pricing engine itself never fails: malformed options and operators are
//! repaired rather than rejected. These error types cover the outer layers
//! (storage, share links, configuration, editing by id).

use thiserror::Error;

/// Main error type for oppboard
#[derive(Error, Debug)]
pub enum OppBoardError {
    /// IO errors (store files, config files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors (loading, parsing, validation)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Key-value store errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Share link encoding/decoding errors
    #[error("Share link error: {0}")]
    Share(String),

    /// Lookup by id failed (opportunity, option, operator, column)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation errors (column titles, board edits)
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for oppboard operations
pub type Result<T> = std::result::Result<T, OppBoardError>;

impl OppBoardError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a share link error
    pub fn share(msg: impl Into<String>) -> Self {
        Self::Share(msg.into())
    }

    /// Create a not-found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
