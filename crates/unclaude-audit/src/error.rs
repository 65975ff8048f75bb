//! Audit log error type.

use thiserror::Error;
use unclaude_storage::StorageError;

/// Errors from audit log construction, writes, and queries.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The backing store failed.
    #[error("audit store error: {0}")]
    Store(#[from] StorageError),

    /// An event's data payload failed to serialize.
    #[error("failed to serialize audit event data: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for audit log operations.
pub type AuditResult<T> = Result<T, AuditError>;
