//! Error type for the session store.

/// Errors raised by [`crate::SessionStore`] operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    /// An I/O operation on the session log file failed.
    #[error("session store I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// No session log exists for the requested key.
    #[error("no session found for key {0:?}")]
    NotFound(String),
    /// The log's first line was missing or not a valid `session_meta` record.
    #[error("session log {0:?} is missing its metadata line")]
    MissingMetadata(String),
}

/// Result alias for this crate.
pub type SessionStoreResult<T> = Result<T, SessionStoreError>;
