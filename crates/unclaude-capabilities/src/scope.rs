//! Capability scope: narrows a capability by path/command/domain patterns,
//! TTL, and quota/rate limits (spec §3 Capability Scope).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CapabilityResult;
use crate::pattern::{compile_all, matches_any_or_unrestricted};

/// Per-capability narrowing. Pattern lists are stored as raw strings
/// (serializable, shown in `get_grants()` introspection) and compiled to
/// globs on demand by the checking code.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapabilityScope {
    /// Glob patterns the capability applies to (empty = unrestricted).
    #[serde(default)]
    pub paths: Vec<String>,
    /// Glob patterns for shell commands.
    #[serde(default)]
    pub commands: Vec<String>,
    /// Glob patterns for URL hostnames.
    #[serde(default)]
    pub domains: Vec<String>,
    /// Time-from-creation expiry, seconds. `None` = never expires.
    #[serde(default)]
    pub ttl_seconds: Option<i64>,
    /// Hard invocation cap. `-1` = unlimited.
    #[serde(default = "unlimited")]
    pub max_invocations: i64,
    /// Sliding-window rate limit count. `-1` disables.
    #[serde(default = "unlimited")]
    pub rate_limit_count: i64,
    /// Sliding-window width, seconds.
    #[serde(default)]
    pub rate_limit_window_s: i64,
}

const fn unlimited() -> i64 {
    -1
}

impl CapabilityScope {
    /// An unrestricted scope: no path/command/domain narrowing, no TTL, no
    /// quota, no rate limit.
    #[must_use]
    pub fn unrestricted() -> Self {
        Self {
            paths: Vec::new(),
            commands: Vec::new(),
            domains: Vec::new(),
            ttl_seconds: None,
            max_invocations: -1,
            rate_limit_count: -1,
            rate_limit_window_s: 0,
        }
    }

    /// Builder: restrict to the given path globs.
    #[must_use]
    pub fn with_paths(mut self, paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.paths = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: restrict to the given command globs.
    #[must_use]
    pub fn with_commands(mut self, commands: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.commands = commands.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: set a TTL in seconds.
    #[must_use]
    pub fn with_ttl_seconds(mut self, ttl: i64) -> Self {
        self.ttl_seconds = Some(ttl);
        self
    }

    /// Builder: set a hard invocation cap.
    #[must_use]
    pub fn with_max_invocations(mut self, max: i64) -> Self {
        self.max_invocations = max;
        self
    }

    /// Builder: set a sliding-window rate limit.
    #[must_use]
    pub fn with_rate_limit(mut self, count: i64, window_s: i64) -> Self {
        self.rate_limit_count = count;
        self.rate_limit_window_s = window_s;
        self
    }

    /// `true` if `granted_at + ttl_seconds` is in the past (spec §3
    /// [SUPPLEMENT]: TTL is relative to `granted_at`, per the original).
    #[must_use]
    pub fn is_expired(&self, granted_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self.ttl_seconds {
            Some(ttl) => now > granted_at + chrono::Duration::seconds(ttl),
            None => false,
        }
    }

    /// `true` if `invocation_count` has reached `max_invocations`.
    #[must_use]
    pub fn is_exhausted(&self, invocation_count: u64) -> bool {
        self.max_invocations >= 0 && invocation_count >= self.max_invocations as u64
    }

    /// Prune `timestamps` (not mutating the caller's copy) to those within
    /// the sliding window ending at `now`, and report whether the *next*
    /// invocation would exceed `rate_limit_count`.
    #[must_use]
    pub fn rate_limited(&self, timestamps: &[DateTime<Utc>], now: DateTime<Utc>) -> bool {
        if self.rate_limit_count < 0 {
            return false;
        }
        let cutoff = now - chrono::Duration::seconds(self.rate_limit_window_s.max(0));
        let in_window = timestamps.iter().filter(|ts| **ts > cutoff).count();
        in_window >= self.rate_limit_count as usize
    }

    /// Drop timestamps older than the sliding window (the lazy prune
    /// performed on the check path, spec §4.1).
    pub fn prune_window(&self, timestamps: &mut Vec<DateTime<Utc>>, now: DateTime<Utc>) {
        if self.rate_limit_window_s <= 0 {
            return;
        }
        let cutoff = now - chrono::Duration::seconds(self.rate_limit_window_s);
        timestamps.retain(|ts| *ts > cutoff);
    }

    /// `true` if `path` matches the path scope (or the scope is unrestricted).
    ///
    /// # Errors
    ///
    /// Returns an error if a stored pattern fails to compile.
    pub fn path_allowed(&self, path: &str) -> CapabilityResult<bool> {
        let patterns = compile_all(self.paths.iter().cloned())?;
        Ok(matches_any_or_unrestricted(&patterns, path))
    }

    /// `true` if `command` matches the command scope (or unrestricted).
    ///
    /// # Errors
    ///
    /// Returns an error if a stored pattern fails to compile.
    pub fn command_allowed(&self, command: &str) -> CapabilityResult<bool> {
        let patterns = compile_all(self.commands.iter().cloned())?;
        Ok(matches_any_or_unrestricted(&patterns, command))
    }

    /// `true` if `hostname` matches the domain scope (or unrestricted).
    ///
    /// # Errors
    ///
    /// Returns an error if a stored pattern fails to compile.
    pub fn domain_allowed(&self, hostname: &str) -> CapabilityResult<bool> {
        let patterns = compile_all(self.domains.iter().cloned())?;
        Ok(matches_any_or_unrestricted(&patterns, hostname))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrestricted_scope_never_expires_or_exhausts() {
        let scope = CapabilityScope::unrestricted();
        assert!(!scope.is_expired(Utc::now(), Utc::now()));
        assert!(!scope.is_exhausted(1_000_000));
    }

    #[test]
    fn ttl_expiry_is_relative_to_granted_at() {
        let scope = CapabilityScope::unrestricted().with_ttl_seconds(60);
        let granted_at = Utc::now() - chrono::Duration::seconds(61);
        assert!(scope.is_expired(granted_at, Utc::now()));

        let granted_at = Utc::now() - chrono::Duration::seconds(10);
        assert!(!scope.is_expired(granted_at, Utc::now()));
    }

    #[test]
    fn rate_limit_counts_within_window() {
        let scope = CapabilityScope::unrestricted().with_rate_limit(3, 60);
        let now = Utc::now();
        let timestamps = vec![now, now, now];
        assert!(scope.rate_limited(&timestamps, now));

        let timestamps = vec![now, now];
        assert!(!scope.rate_limited(&timestamps, now));
    }

    #[test]
    fn prune_window_drops_stale_entries() {
        let scope = CapabilityScope::unrestricted().with_rate_limit(3, 60);
        let now = Utc::now();
        let mut timestamps = vec![now - chrono::Duration::seconds(120), now];
        scope.prune_window(&mut timestamps, now);
        assert_eq!(timestamps.len(), 1);
    }
}
