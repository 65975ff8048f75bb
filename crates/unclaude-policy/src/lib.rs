//! The policy engine (C3): a single `enforce()` entry point composing
//! capability-based authorization (`unclaude-capabilities`) and sandbox
//! policy (`unclaude-sandbox`) as two independent, orthogonal concerns.
//!
//! Presets (`readonly`, `developer`, `strict`, ...) are constructor
//! shortcuts on the two composed crates, not a hierarchy layered onto this
//! one — `PolicyEngine` never inherits from either.
//!
//! ```rust,no_run
//! use unclaude_capabilities::{Capability, CapabilitySet, Profile};
//! use unclaude_policy::{EnforceContext, PolicyEngine};
//! use unclaude_sandbox::{SandboxPolicy, SandboxProfile};
//!
//! let (capabilities, _token) = CapabilitySet::new(Profile::Developer);
//! let sandbox = SandboxPolicy::for_profile(SandboxProfile::Standard);
//! let mut engine = PolicyEngine::new(capabilities, sandbox);
//!
//! match engine.enforce(Capability::FileRead, EnforceContext::path("/tmp/x", false)) {
//!     Ok(()) => {}
//!     Err(violation) => eprintln!("denied: {violation}"),
//! }
//! ```

#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod engine;
mod error;
mod tool_map;

pub use engine::{EnforceContext, PolicyEngine};
pub use error::{PolicyResult, PolicyViolation};
pub use tool_map::capability_for_tool;
