//! Error type for the usage tracker.

/// Errors raised by [`crate::UsageTracker`] operations.
#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    /// The underlying relational store failed.
    #[error("usage store error: {0}")]
    Storage(#[from] unclaude_storage::StorageError),
    /// A custom period was requested without both bounds.
    #[error("custom period requires both start and end timestamps")]
    IncompleteCustomRange,
}

/// Result alias for this crate.
pub type UsageResult<T> = Result<T, UsageError>;
