//! The capability set (spec §3 Capability Set, §4.1 Public contract).

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use unclaude_crypto::{ContentHash, PlaintextToken};

use crate::capability::Capability;
use crate::context::CheckContext;
use crate::grant::{CapabilityGrant, GrantRecord, GrantedBy};
use crate::profile::Profile;
use crate::scope::CapabilityScope;

/// Outcome of a [`CapabilitySet::check`] or [`CapabilitySet::use_capability`]
/// call: `(allowed, reason)` per spec §4.1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    /// Whether the capability use is authorized.
    pub allowed: bool,
    /// Human-readable reason; always populated, even on success.
    pub reason: String,
}

impl CheckResult {
    fn allow(reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            reason: reason.into(),
        }
    }

    fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
        }
    }
}

/// A capability → grant map plus the bearer token that identifies it.
///
/// Construction via [`CapabilitySet::new`] returns the one-time plaintext
/// token alongside the set; only the token's SHA-256 digest is retained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilitySet {
    grants: HashMap<Capability, GrantRecord>,
    token_digest: ContentHash,
}

impl CapabilitySet {
    /// Construct a capability set from a preset `profile`, returning the set
    /// and the one-time plaintext bearer token.
    #[must_use]
    pub fn new(profile: Profile) -> (Self, PlaintextToken) {
        let token = PlaintextToken::generate();
        let mut grants = HashMap::new();
        for grant in profile.default_grants() {
            grants.insert(grant.capability, GrantRecord::new(grant));
        }
        (
            Self {
                grants,
                token_digest: token.digest(),
            },
            token,
        )
    }

    /// Construct an empty capability set (no grants), with a fresh token.
    #[must_use]
    pub fn empty() -> (Self, PlaintextToken) {
        let token = PlaintextToken::generate();
        (
            Self {
                grants: HashMap::new(),
                token_digest: token.digest(),
            },
            token,
        )
    }

    /// `true` if `token`'s digest matches this set's stored token digest.
    #[must_use]
    pub fn token_matches(&self, token: &PlaintextToken) -> bool {
        token.digest() == self.token_digest
    }

    /// Add or replace a grant.
    pub fn grant(
        &mut self,
        capability: Capability,
        scope: CapabilityScope,
        granted_by: GrantedBy,
        reason: impl Into<String>,
    ) {
        let grant = CapabilityGrant::new(capability, scope, granted_by, reason);
        self.grants.insert(capability, GrantRecord::new(grant));
    }

    /// Remove a grant if present.
    pub fn revoke(&mut self, capability: Capability) {
        self.grants.remove(&capability);
    }

    /// Presence check, ignoring scope, TTL, and quota.
    #[must_use]
    pub fn has(&self, capability: Capability) -> bool {
        self.grants.contains_key(&capability)
    }

    /// Enumerate current grants, for introspection/audit (spec §4.1
    /// `get_grants`).
    #[must_use]
    pub fn get_grants(&self) -> Vec<&CapabilityGrant> {
        self.grants.values().map(|r| &r.grant).collect()
    }

    /// Pure authorization check (I1, I2): presence → TTL expiry →
    /// max-invocation exhaustion → rate-limit window → path → command →
    /// domain. The first failing check determines the reason. Never
    /// mutates state.
    #[must_use]
    pub fn check(&self, capability: Capability, ctx: CheckContext<'_>) -> CheckResult {
        let Some(record) = self.grants.get(&capability) else {
            return CheckResult::deny(format!("capability {capability} not granted"));
        };

        self.check_record(record, ctx)
    }

    fn check_record(&self, record: &GrantRecord, ctx: CheckContext<'_>) -> CheckResult {
        let now = Utc::now();
        let scope = &record.grant.scope;

        if scope.is_expired(record.grant.granted_at, now) {
            return CheckResult::deny(format!(
                "capability {} grant expired at {}",
                record.grant.capability,
                record.grant.granted_at + chrono::Duration::seconds(scope.ttl_seconds.unwrap_or(0))
            ));
        }

        if scope.is_exhausted(record.counters.invocation_count) {
            return CheckResult::deny(format!(
                "capability {} exhausted its max_invocations ({})",
                record.grant.capability, scope.max_invocations
            ));
        }

        if scope.rate_limited(&record.counters.rate_window, now) {
            return CheckResult::deny(format!(
                "capability {} hit rate limit ({} per {}s)",
                record.grant.capability, scope.rate_limit_count, scope.rate_limit_window_s
            ));
        }

        if let Some(path) = ctx.path {
            match scope.path_allowed(path) {
                Ok(true) => {}
                Ok(false) => {
                    return CheckResult::deny(format!(
                        "path {path:?} does not match the capability's scoped paths"
                    ));
                }
                Err(e) => return CheckResult::deny(format!("path scope pattern error: {e}")),
            }
        }

        if let Some(command) = ctx.command {
            match scope.command_allowed(command) {
                Ok(true) => {}
                Ok(false) => {
                    return CheckResult::deny(format!(
                        "command {command:?} does not match the capability's scoped commands"
                    ));
                }
                Err(e) => return CheckResult::deny(format!("command scope pattern error: {e}")),
            }
        }

        if let Some(url) = ctx.url {
            let hostname = url::Url::parse(url)
                .ok()
                .and_then(|u| u.host_str().map(str::to_string));
            let Some(hostname) = hostname else {
                return CheckResult::deny(format!("url {url:?} has no parseable hostname"));
            };
            match scope.domain_allowed(&hostname) {
                Ok(true) => {}
                Ok(false) => {
                    return CheckResult::deny(format!(
                        "domain {hostname:?} does not match the capability's scoped domains"
                    ));
                }
                Err(e) => return CheckResult::deny(format!("domain scope pattern error: {e}")),
            }
        }

        CheckResult::allow(format!("capability {} authorized", record.grant.capability))
    }

    /// Authorization check that, on success, records the invocation (I3: the
    /// only mutating operation). On denial, no counter is mutated (I2/P2).
    pub fn use_capability(&mut self, capability: Capability, ctx: CheckContext<'_>) -> CheckResult {
        let Some(record) = self.grants.get(&capability) else {
            return CheckResult::deny(format!("capability {capability} not granted"));
        };

        let result = self.check_record(record, ctx);
        if result.allowed {
            let now = Utc::now();
            let record = self
                .grants
                .get_mut(&capability)
                .expect("presence re-checked above");
            record.grant.scope.prune_window(&mut record.counters.rate_window, now);
            record.counters.invocation_count += 1;
            record.counters.rate_window.push(now);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_capability_is_denied_closed() {
        let (set, _token) = CapabilitySet::empty();
        let result = set.check(Capability::FileWrite, CheckContext::none());
        assert!(!result.allowed);
        assert!(result.reason.contains("not granted"));
    }

    #[test]
    fn readonly_profile_denies_file_write() {
        let (set, _token) = CapabilitySet::new(Profile::Readonly);
        let result = set.check(Capability::FileWrite, CheckContext::path("/tmp/foo"));
        assert!(!result.allowed);
    }

    #[test]
    fn use_capability_increments_only_on_success() {
        let (mut set, _token) = CapabilitySet::new(Profile::Developer);
        set.grant(
            Capability::NetFetch,
            CapabilityScope::unrestricted().with_rate_limit(3, 60),
            GrantedBy::Manual,
            "test",
        );

        for _ in 0..3 {
            let result = set.use_capability(Capability::NetFetch, CheckContext::none());
            assert!(result.allowed);
        }
        let fourth = set.use_capability(Capability::NetFetch, CheckContext::none());
        assert!(!fourth.allowed);
        assert!(fourth.reason.contains("rate limit"));

        let record = set.grants.get(&Capability::NetFetch).unwrap();
        assert_eq!(record.counters.invocation_count, 3);
        assert_eq!(record.counters.rate_window.len(), 3);
    }

    #[test]
    fn denied_check_never_mutates_counters() {
        let (mut set, _token) = CapabilitySet::empty();
        set.grant(
            Capability::FileRead,
            CapabilityScope::unrestricted().with_paths(["/allowed/**"]),
            GrantedBy::Manual,
            "test",
        );

        let _ = set.use_capability(Capability::FileRead, CheckContext::path("/denied/file"));
        let record = set.grants.get(&Capability::FileRead).unwrap();
        assert_eq!(record.counters.invocation_count, 0);
    }

    #[test]
    fn token_digest_matches_generated_token() {
        let (set, token) = CapabilitySet::new(Profile::Readonly);
        assert!(set.token_matches(&token));
        let other = PlaintextToken::generate();
        assert!(!set.token_matches(&other));
    }

    #[test]
    fn revoke_removes_the_grant() {
        let (mut set, _token) = CapabilitySet::new(Profile::Readonly);
        assert!(set.has(Capability::FileRead));
        set.revoke(Capability::FileRead);
        assert!(!set.has(Capability::FileRead));
    }
}
