//! Capability error types.

use thiserror::Error;

/// Errors from capability set construction and pattern handling.
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// A glob pattern for a path, command, or domain scope failed to compile.
    #[error("invalid scope pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// The offending pattern text.
        pattern: String,
        /// Why the compiler rejected it.
        reason: String,
    },

    /// The capability string did not match the closed enumeration (spec §3).
    #[error("unknown capability: {0}")]
    UnknownCapability(String),
}

/// Result type for capability operations.
pub type CapabilityResult<T> = Result<T, CapabilityError>;
