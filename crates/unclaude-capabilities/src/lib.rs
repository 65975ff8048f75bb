//! Capability-based authorization (C1, spec §3-§4.1).
//!
//! A [`CapabilitySet`] holds a map of [`Capability`] → grant, each grant
//! narrowed by a [`CapabilityScope`] (paths/commands/domains/TTL/quota/rate
//! limit). `check()` is a pure authorization query; `use_capability()` is
//! the sole mutating operation, incrementing counters only on success (I3).

#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod capability;
mod context;
mod error;
mod grant;
mod pattern;
mod profile;
mod scope;
mod set;

pub use capability::Capability;
pub use context::CheckContext;
pub use error::{CapabilityError, CapabilityResult};
pub use grant::{CapabilityGrant, GrantCounters, GrantRecord, GrantedBy};
pub use pattern::{GlobPattern, compile_all, matches_any_or_unrestricted};
pub use profile::Profile;
pub use scope::CapabilityScope;
pub use set::{CapabilitySet, CheckResult};
