//! Sandbox policy error types.

use thiserror::Error;

/// Errors from sandbox policy construction and checking.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// A deny/allow glob pattern failed to compile.
    #[error("invalid sandbox pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// The offending pattern text.
        pattern: String,
        /// Why the compiler rejected it.
        reason: String,
    },

    /// An unknown preset name was requested.
    #[error("unknown sandbox profile: {0}")]
    UnknownProfile(String),
}

/// Result type for sandbox operations.
pub type SandboxResult<T> = Result<T, SandboxError>;
