//! Storage error types.

use thiserror::Error;

/// Errors from key-value and relational storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A namespace or key failed validation.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The embedded database backend returned an error.
    #[error("database error: {0}")]
    Database(String),

    /// (De)serialization of a stored value failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Underlying filesystem I/O failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
