//! Error type for the task queue.

/// Errors raised by [`crate::TaskQueue`] operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskQueueError {
    /// An I/O operation on the queue file failed.
    #[error("task queue I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The queue file exists but could not be parsed as JSON.
    #[error("task queue file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    /// No task exists with the requested id.
    #[error("no task found with id {0:?}")]
    NotFound(String),
}

/// Result alias for this crate.
pub type TaskQueueResult<T> = Result<T, TaskQueueError>;
