//! Policy engine error type.

use thiserror::Error;
use unclaude_capabilities::Capability;

/// An action was denied by the capability set or the sandbox policy.
#[derive(Debug, Error)]
#[error("policy violation: capability={capability} context={context} reason={reason}")]
pub struct PolicyViolation {
    /// The capability the caller attempted to use.
    pub capability: Capability,
    /// A short description of what was being attempted (path/command/url/action).
    pub context: String,
    /// Why it was denied.
    pub reason: String,
}

/// Result type for `enforce`.
pub type PolicyResult<T> = Result<T, PolicyViolation>;
