//! The policy engine (C3): composes a [`CapabilitySet`] and a
//! [`SandboxPolicy`] as two independent values, never a hierarchy.

use unclaude_capabilities::{Capability, CapabilitySet, CheckContext};
use unclaude_sandbox::{ResourceKind, SandboxPolicy};

use crate::error::{PolicyResult, PolicyViolation};

/// What a single `enforce` call is attempting, beyond the capability itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnforceContext<'a> {
    /// Filesystem path being accessed.
    pub path: Option<&'a str>,
    /// Shell command being run.
    pub command: Option<&'a str>,
    /// URL being fetched/posted/connected to.
    pub url: Option<&'a str>,
    /// A resource to consume (file creation, process spawn), if any.
    pub action: Option<ResourceKind>,
    /// Whether the path access, if any, is a write.
    pub is_write: bool,
}

impl<'a> EnforceContext<'a> {
    /// No additional context — capability presence/TTL/quota only.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Context carrying a file path.
    #[must_use]
    pub fn path(path: &'a str, is_write: bool) -> Self {
        Self {
            path: Some(path),
            is_write,
            ..Self::default()
        }
    }

    /// Context carrying a shell command.
    #[must_use]
    pub fn command(command: &'a str) -> Self {
        Self {
            command: Some(command),
            ..Self::default()
        }
    }

    /// Context carrying a URL.
    #[must_use]
    pub fn url(url: &'a str) -> Self {
        Self {
            url: Some(url),
            ..Self::default()
        }
    }

    /// Attach a resource action to consume on success.
    #[must_use]
    pub fn with_action(mut self, action: ResourceKind) -> Self {
        self.action = Some(action);
        self
    }

    fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(p) = self.path {
            parts.push(format!("path={p:?}"));
        }
        if let Some(c) = self.command {
            parts.push(format!("command={c:?}"));
        }
        if let Some(u) = self.url {
            parts.push(format!("url={u:?}"));
        }
        if let Some(a) = self.action {
            parts.push(format!("action={a:?}"));
        }
        if parts.is_empty() {
            "none".to_string()
        } else {
            parts.join(" ")
        }
    }
}

/// Composes capability authorization and sandbox enforcement behind a
/// single `enforce` entry point.
pub struct PolicyEngine {
    capabilities: CapabilitySet,
    sandbox: SandboxPolicy,
}

impl PolicyEngine {
    /// Build an engine from an already-constructed capability set and
    /// sandbox policy. The two are independent values; this constructor
    /// does not derive one from the other.
    #[must_use]
    pub fn new(capabilities: CapabilitySet, sandbox: SandboxPolicy) -> Self {
        Self {
            capabilities,
            sandbox,
        }
    }

    /// The underlying capability set, for introspection/audit.
    #[must_use]
    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    /// The underlying sandbox policy, for introspection/audit.
    #[must_use]
    pub fn sandbox(&self) -> &SandboxPolicy {
        &self.sandbox
    }

    /// Enforce `capability` against `ctx`, succeeding silently or failing
    /// with a [`PolicyViolation`].
    ///
    /// The sandbox's pattern checks (path, command, network) are pure reads
    /// and run first; a denial there raises without touching the
    /// capability's invocation counter. Only once every pattern check has
    /// passed is `capabilities.use_capability` invoked — the capability
    /// set's sole mutation — followed by the resource-counter check, the
    /// sandbox's own sole mutation. This ordering is what makes a sandbox
    /// denial leave the capability's counters untouched (spec §8 S2).
    ///
    /// # Errors
    ///
    /// Returns [`PolicyViolation`] at the first failing check.
    pub fn enforce(&mut self, capability: Capability, ctx: EnforceContext<'_>) -> PolicyResult<()> {
        if let Some(path) = ctx.path {
            let check = self.sandbox.check_file(path, ctx.is_write);
            if !check.allowed {
                return Err(PolicyViolation {
                    capability,
                    context: ctx.describe(),
                    reason: check.reason,
                });
            }
        }

        if let Some(command) = ctx.command {
            let check = self.sandbox.check_command(command);
            if !check.allowed {
                return Err(PolicyViolation {
                    capability,
                    context: ctx.describe(),
                    reason: check.reason,
                });
            }
        }

        if let Some(url) = ctx.url {
            let check = self.sandbox.check_network(url);
            if !check.allowed {
                return Err(PolicyViolation {
                    capability,
                    context: ctx.describe(),
                    reason: check.reason,
                });
            }
        }

        let cap_ctx = CheckContext {
            path: ctx.path,
            command: ctx.command,
            url: ctx.url,
        };
        let result = self.capabilities.use_capability(capability, cap_ctx);
        if !result.allowed {
            return Err(PolicyViolation {
                capability,
                context: ctx.describe(),
                reason: result.reason,
            });
        }

        if let Some(action) = ctx.action {
            let check = self.sandbox.check_resource(action);
            if !check.allowed {
                return Err(PolicyViolation {
                    capability,
                    context: ctx.describe(),
                    reason: check.reason,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unclaude_capabilities::Profile;
    use unclaude_sandbox::SandboxProfile;

    fn engine(cap_profile: Profile, sandbox_profile: SandboxProfile) -> PolicyEngine {
        let (capabilities, _token) = CapabilitySet::new(cap_profile);
        let sandbox = SandboxPolicy::for_profile(sandbox_profile);
        PolicyEngine::new(capabilities, sandbox)
    }

    #[test]
    fn missing_capability_raises_without_touching_sandbox() {
        let mut engine = engine(Profile::Readonly, SandboxProfile::Standard);
        let err = engine
            .enforce(Capability::FileWrite, EnforceContext::path("/tmp/foo", true))
            .unwrap_err();
        assert_eq!(err.capability, Capability::FileWrite);
        assert!(err.reason.contains("not granted"));
    }

    #[test]
    fn dangerous_command_denied_even_with_capability() {
        let mut engine = engine(Profile::Autonomous, SandboxProfile::Permissive);
        let err = engine
            .enforce(Capability::ExecShell, EnforceContext::command("rm -rf /"))
            .unwrap_err();
        assert!(err.reason.contains("rm -rf /*"));
    }

    #[test]
    fn allowed_action_passes_through() {
        let mut engine = engine(Profile::Developer, SandboxProfile::Standard);
        let result = engine.enforce(Capability::FileRead, EnforceContext::path("/tmp/ok", false));
        assert!(result.is_ok());
    }
}
