//! Sandbox policy: deny/allow pattern matching over paths, commands, and
//! domains, plus resource limit presets and their live counters.
//!
//! This is one of the two independent pillars composed by the policy
//! engine (the other being `unclaude-capabilities`). Neither pillar depends
//! on the other; they are evaluated as two separate values and ANDed
//! together by the caller.
//!
//! ```rust,no_run
//! use unclaude_sandbox::{SandboxPolicy, SandboxProfile};
//!
//! let mut policy = SandboxPolicy::for_profile(SandboxProfile::Standard);
//! policy.allow_paths(["/workspace/**"]);
//! let result = policy.check_file("/workspace/src/main.rs", true);
//! assert!(result.allowed);
//! ```

#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod defaults;
mod error;
mod limits;
mod pattern;
mod policy;
mod profile;

pub use defaults::{ALWAYS_DENIED_COMMANDS, ALWAYS_DENIED_PATHS};
pub use error::{SandboxError, SandboxResult};
pub use limits::{ResourceCounters, ResourceKind, ResourceLimits};
pub use pattern::{compile_all, first_match, GlobPattern};
pub use policy::{CheckResult, SandboxPolicy};
pub use profile::SandboxProfile;
