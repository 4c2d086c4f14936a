//! Storage error types.

use ephemera_traits::EngineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    /// A round-trip to the engine failed. Never retried here.
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// The engine returned a record that is missing required fields.
    #[error("invalid record at {key}: {reason}")]
    InvalidRecord { key: String, reason: String },
}

impl StorageError {
    pub fn config<E: std::fmt::Display>(err: E) -> Self {
        Self::Config(err.to_string())
    }

    pub fn invalid_record(key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;
