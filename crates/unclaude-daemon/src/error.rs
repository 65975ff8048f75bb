//! Daemon runtime error type.

use thiserror::Error;

/// Errors raised by the daemon runtime, its main loop, and the agent
/// iteration loop. Policy violations and tool failures are deliberately
/// *not* variants here — they are converted to tool-result content and fed
/// back to the LLM (spec §7 propagation policy); only errors that terminate
/// a task or the daemon itself surface here.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// An I/O operation (status file, pid file, watcher) failed.
    #[error("daemon I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The status or pid file held malformed JSON.
    #[error("malformed daemon state file: {0}")]
    Serialization(#[from] serde_json::Error),

    /// `config.yaml` or `proactive.yaml` failed to load.
    #[error("configuration error: {0}")]
    Config(#[from] unclaude_config::ConfigError),

    /// The identity manager could not be initialized or a session could
    /// not be minted.
    #[error("identity error: {0}")]
    Identity(#[from] unclaude_identity::IdentityError),

    /// The session store failed to create, append, or load a conversation.
    #[error("session store error: {0}")]
    Session(#[from] unclaude_sessions::SessionStoreError),

    /// The task queue failed to read or rewrite.
    #[error("task queue error: {0}")]
    TaskQueue(#[from] unclaude_tasks::TaskQueueError),

    /// The usage tracker failed to record or aggregate.
    #[error("usage tracker error: {0}")]
    Usage(#[from] unclaude_usage::UsageError),

    /// The audit log failed to write or query.
    #[error("audit log error: {0}")]
    Audit(#[from] unclaude_audit::AuditError),

    /// Identity or delegation chain verification failed for the task's
    /// session. Always terminal for that session (spec §7).
    #[error("identity chain invalid for session {session_id}: {reason}")]
    ChainInvalid {
        /// The session whose chain failed verification.
        session_id: String,
        /// Human-readable reason.
        reason: String,
    },

    /// The active budget blocked the call outright (action = block).
    #[error("budget exceeded: {0}")]
    BudgetBlocked(String),

    /// A condition the spec classifies as fatal: corrupted pid file,
    /// unreadable identity files, an unwritable state directory.
    #[error("fatal daemon error: {0}")]
    Fatal(String),
}

/// Result alias for daemon operations.
pub type DaemonResult<T> = Result<T, DaemonError>;
