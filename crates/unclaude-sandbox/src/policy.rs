//! The sandbox policy (spec §3 Sandbox Policy, §4.2 Public contract).

use serde::{Deserialize, Serialize};

use crate::defaults::{ALWAYS_DENIED_COMMANDS, ALWAYS_DENIED_PATHS};
use crate::limits::{ResourceCounters, ResourceKind, ResourceLimits};
use crate::pattern::{compile_all, first_match};
use crate::profile::SandboxProfile;

/// `(allowed, reason)`, matching spec's uniform check-result shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    /// Whether the action is allowed.
    pub allowed: bool,
    /// Human-readable reason.
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

/// Deny/allow pattern lists plus resource ceilings and live counters for one
/// session's sandbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxPolicy {
    allowed_paths: Vec<String>,
    denied_paths: Vec<String>,
    allowed_domains: Vec<String>,
    denied_domains: Vec<String>,
    allowed_commands: Vec<String>,
    denied_commands: Vec<String>,
    limits: ResourceLimits,
    counters: ResourceCounters,
}

impl SandboxPolicy {
    /// Build a fresh policy for `profile`, with the hardcoded secret-path and
    /// dangerous-command denials always present (spec §3).
    #[must_use]
    pub fn for_profile(profile: SandboxProfile) -> Self {
        Self {
            allowed_paths: Vec::new(),
            denied_paths: ALWAYS_DENIED_PATHS.iter().map(|s| (*s).to_string()).collect(),
            allowed_domains: Vec::new(),
            denied_domains: Vec::new(),
            allowed_commands: Vec::new(),
            denied_commands: ALWAYS_DENIED_COMMANDS.iter().map(|s| (*s).to_string()).collect(),
            limits: profile.limits(),
            counters: ResourceCounters::default(),
        }
    }

    /// Add allowed path globs.
    pub fn allow_paths(&mut self, patterns: impl IntoIterator<Item = impl Into<String>>) {
        self.allowed_paths.extend(patterns.into_iter().map(Into::into));
    }

    /// Add denied path globs (in addition to the always-present secret paths).
    pub fn deny_paths(&mut self, patterns: impl IntoIterator<Item = impl Into<String>>) {
        self.denied_paths.extend(patterns.into_iter().map(Into::into));
    }

    /// Add allowed domain globs.
    pub fn allow_domains(&mut self, patterns: impl IntoIterator<Item = impl Into<String>>) {
        self.allowed_domains.extend(patterns.into_iter().map(Into::into));
    }

    /// Add denied domain globs.
    pub fn deny_domains(&mut self, patterns: impl IntoIterator<Item = impl Into<String>>) {
        self.denied_domains.extend(patterns.into_iter().map(Into::into));
    }

    /// The resource ceilings in effect.
    #[must_use]
    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    /// Live resource counters.
    #[must_use]
    pub fn counters(&self) -> &ResourceCounters {
        &self.counters
    }

    /// Check a file access. Expands `~`, tests deny globs first (always
    /// wins), then allow globs if the allow list is non-empty.
    ///
    /// `is_write` does not currently change matching semantics (both read and
    /// write paths share one allow/deny list) but is threaded through for
    /// call-site clarity and future read/write-specific policies.
    #[must_use]
    pub fn check_file(&self, path: &str, is_write: bool) -> CheckResult {
        let expanded = expand_tilde(path);

        let denied = match compile_all(self.denied_paths.iter().cloned()) {
            Ok(patterns) => patterns,
            Err(e) => return CheckResult::deny(format!("denied-path pattern error: {e}")),
        };
        if let Some(m) = first_match(&denied, &expanded) {
            return CheckResult::deny(format!("path matches denied pattern: {}", m.as_str()));
        }

        if !self.allowed_paths.is_empty() {
            let allowed = match compile_all(self.allowed_paths.iter().cloned()) {
                Ok(patterns) => patterns,
                Err(e) => return CheckResult::deny(format!("allowed-path pattern error: {e}")),
            };
            if first_match(&allowed, &expanded).is_none() {
                return CheckResult::deny(format!(
                    "path {expanded:?} does not match any allowed pattern"
                ));
            }
        }

        let verb = if is_write { "write" } else { "read" };
        CheckResult::allow(format!("{verb} access to {expanded:?} permitted"))
    }

    /// Check a shell command: lowercase and trim, then test deny globs
    /// first, then allow globs if non-empty.
    #[must_use]
    pub fn check_command(&self, cmd: &str) -> CheckResult {
        let normalized = cmd.trim().to_lowercase();

        let denied = match compile_all(self.denied_commands.iter().cloned()) {
            Ok(patterns) => patterns,
            Err(e) => return CheckResult::deny(format!("denied-command pattern error: {e}")),
        };
        if let Some(m) = first_match(&denied, &normalized) {
            return CheckResult::deny(format!("command matches denied pattern: {}", m.as_str()));
        }

        if !self.allowed_commands.is_empty() {
            let allowed = match compile_all(self.allowed_commands.iter().cloned()) {
                Ok(patterns) => patterns,
                Err(e) => return CheckResult::deny(format!("allowed-command pattern error: {e}")),
            };
            if first_match(&allowed, &normalized).is_none() {
                return CheckResult::deny(format!(
                    "command {normalized:?} does not match any allowed pattern"
                ));
            }
        }

        CheckResult::allow("command permitted")
    }

    /// Check an outbound URL by extracting its hostname, then applying the
    /// same deny-first/allow-if-nonempty rule.
    #[must_use]
    pub fn check_network(&self, url: &str) -> CheckResult {
        let Ok(parsed) = url::Url::parse(url) else {
            return CheckResult::deny(format!("url {url:?} failed to parse"));
        };
        let Some(hostname) = parsed.host_str() else {
            return CheckResult::deny(format!("url {url:?} has no hostname"));
        };

        let denied = match compile_all(self.denied_domains.iter().cloned()) {
            Ok(patterns) => patterns,
            Err(e) => return CheckResult::deny(format!("denied-domain pattern error: {e}")),
        };
        if let Some(m) = first_match(&denied, hostname) {
            return CheckResult::deny(format!("domain matches denied pattern: {}", m.as_str()));
        }

        if !self.allowed_domains.is_empty() {
            let allowed = match compile_all(self.allowed_domains.iter().cloned()) {
                Ok(patterns) => patterns,
                Err(e) => return CheckResult::deny(format!("allowed-domain pattern error: {e}")),
            };
            if first_match(&allowed, hostname).is_none() {
                return CheckResult::deny(format!(
                    "domain {hostname:?} does not match any allowed pattern"
                ));
            }
        }

        CheckResult::allow(format!("network access to {hostname:?} permitted"))
    }

    /// Check (and, on success, consume) a resource slot. Counters are
    /// lifetime totals and are never decremented on release.
    pub fn check_resource(&mut self, kind: ResourceKind) -> CheckResult {
        match kind {
            ResourceKind::CreateFile => {
                if self.counters.files_created_count >= self.limits.max_files_created {
                    return CheckResult::deny(format!(
                        "max_files_created limit reached ({})",
                        self.limits.max_files_created
                    ));
                }
                self.counters.files_created_count += 1;
                CheckResult::allow("file creation permitted")
            }
            ResourceKind::SpawnProcess => {
                if self.counters.current_concurrent_processes >= self.limits.max_concurrent_processes
                {
                    return CheckResult::deny(format!(
                        "max_concurrent_processes limit reached ({})",
                        self.limits.max_concurrent_processes
                    ));
                }
                self.counters.current_concurrent_processes += 1;
                CheckResult::allow("process spawn permitted")
            }
        }
    }

    /// Release a previously consumed process slot (the counter itself is
    /// never decremented per spec; this only affects
    /// `current_concurrent_processes`, distinct from the lifetime
    /// `files_created_count`).
    pub fn release_process(&mut self) {
        self.counters.current_concurrent_processes =
            self.counters.current_concurrent_processes.saturating_sub(1);
    }
}

fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{}", home.to_string_lossy(), rest);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_paths_are_always_denied() {
        let policy = SandboxPolicy::for_profile(SandboxProfile::Permissive);
        let result = policy.check_file("~/.ssh/id_rsa", false);
        assert!(!result.allowed);
    }

    #[test]
    fn dangerous_commands_are_always_denied() {
        let policy = SandboxPolicy::for_profile(SandboxProfile::Permissive);
        let result = policy.check_command("rm -rf /");
        assert!(!result.allowed);
        assert!(result.reason.contains("rm -rf /*"));
    }

    #[test]
    fn deny_overrides_allow() {
        let mut policy = SandboxPolicy::for_profile(SandboxProfile::Standard);
        policy.allow_paths(["/tmp/**"]);
        policy.deny_paths(["/tmp/secret/**"]);
        assert!(policy.check_file("/tmp/ok.txt", true).allowed);
        assert!(!policy.check_file("/tmp/secret/leak.txt", true).allowed);
    }

    #[test]
    fn empty_allow_list_means_unrestricted() {
        let policy = SandboxPolicy::for_profile(SandboxProfile::Standard);
        assert!(policy.check_file("/any/path.txt", false).allowed);
    }

    #[test]
    fn resource_counter_enforces_cap_and_does_not_decrement() {
        let mut policy = SandboxPolicy::for_profile(SandboxProfile::Strict);
        for _ in 0..20 {
            assert!(policy.check_resource(ResourceKind::CreateFile).allowed);
        }
        assert!(!policy.check_resource(ResourceKind::CreateFile).allowed);
        assert_eq!(policy.counters().files_created_count, 20);
    }

    #[test]
    fn network_check_extracts_hostname() {
        let mut policy = SandboxPolicy::for_profile(SandboxProfile::Standard);
        policy.deny_domains(["*.evil.example"]);
        assert!(policy.check_network("https://api.example.com/v1").allowed);
        assert!(!policy.check_network("https://sub.evil.example/x").allowed);
    }
}
