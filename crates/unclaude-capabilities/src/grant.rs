//! Capability grants: a (capability, scope, provenance) triple, plus the
//! mutable per-grant state the capability set maintains (spec §3 Capability
//! Grant, I2, I3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::capability::Capability;
use crate::scope::CapabilityScope;

/// Where a grant came from: a preset profile name, a subagent delegation, or
/// a manual `grant()` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrantedBy {
    /// Issued as part of constructing a preset profile.
    Profile(String),
    /// Issued as part of a subagent delegation.
    Delegation(String),
    /// Issued by an explicit `grant()` call.
    Manual,
}

impl std::fmt::Display for GrantedBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Profile(name) => write!(f, "profile:{name}"),
            Self::Delegation(id) => write!(f, "delegation:{id}"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// A single capability grant: the capability kind, its scope, and provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityGrant {
    /// The capability kind this grant authorizes.
    pub capability: Capability,
    /// Scope narrowing the grant.
    pub scope: CapabilityScope,
    /// Provenance of this grant.
    pub granted_by: GrantedBy,
    /// Human-readable justification.
    pub reason: String,
    /// When the grant was created (TTL is computed relative to this).
    pub granted_at: DateTime<Utc>,
}

impl CapabilityGrant {
    /// Construct a new grant, stamping `granted_at = now`.
    #[must_use]
    pub fn new(
        capability: Capability,
        scope: CapabilityScope,
        granted_by: GrantedBy,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            capability,
            scope,
            granted_by,
            reason: reason.into(),
            granted_at: Utc::now(),
        }
    }
}

/// Mutable counters attached to a grant (spec §3 Capability Scope: "Mutable
/// counters").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GrantCounters {
    /// Total successful invocations (I3: only `use()` increments this).
    pub invocation_count: u64,
    /// Rolling window of invocation timestamps, used for rate limiting.
    pub rate_window: Vec<DateTime<Utc>>,
}

/// A grant plus its live counters, as held inside a [`crate::CapabilitySet`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantRecord {
    /// The grant itself.
    pub grant: CapabilityGrant,
    /// Mutable usage counters.
    pub counters: GrantCounters,
}

impl GrantRecord {
    /// Wrap a fresh grant with zeroed counters.
    #[must_use]
    pub fn new(grant: CapabilityGrant) -> Self {
        Self {
            grant,
            counters: GrantCounters::default(),
        }
    }
}
