//! Preset capability profiles (spec §3 Capability Set): `readonly` (7),
//! `developer` (14), `autonomous` (16, incl. `exec.shell`), `subagent` (6),
//! `full` (all).

use crate::capability::Capability;
use crate::grant::{CapabilityGrant, GrantedBy};
use crate::scope::CapabilityScope;

/// Name of a preset capability bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Read-only inspection: no writes, no shell, no network posting.
    Readonly,
    /// Local development: file read/write, safe exec, git, memory.
    Developer,
    /// Long-running autonomous operation: developer plus `exec.shell`, net,
    /// and agent spawning.
    Autonomous,
    /// Minimal bundle handed to a spawned subagent.
    Subagent,
    /// Every capability, unrestricted.
    Full,
}

impl Profile {
    /// Parse a profile name from `config.yaml`'s `security.profile`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "readonly" => Some(Self::Readonly),
            "developer" => Some(Self::Developer),
            "autonomous" => Some(Self::Autonomous),
            "subagent" => Some(Self::Subagent),
            "full" => Some(Self::Full),
            _ => None,
        }
    }

    /// The profile's canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Readonly => "readonly",
            Self::Developer => "developer",
            Self::Autonomous => "autonomous",
            Self::Subagent => "subagent",
            Self::Full => "full",
        }
    }

    /// Build the default grants for this profile, each with an unrestricted
    /// scope and `granted_by = Profile(<name>)`.
    #[must_use]
    pub fn default_grants(self) -> Vec<CapabilityGrant> {
        use Capability::*;
        let caps: &[Capability] = match self {
            Self::Readonly => &[
                FileRead, FileGlob, FileGrep, DirList, GitRead, MemoryRead, NetSearch,
            ],
            Self::Developer => &[
                FileRead, FileWrite, FileGlob, FileGrep, DirList, DirCreate, ExecSafe, GitRead,
                GitWrite, GitBranch, MemoryRead, MemoryWrite, NetFetch, NetSearch,
            ],
            Self::Autonomous => &[
                FileRead, FileWrite, FileGlob, FileGrep, DirList, DirCreate, ExecSafe, ExecShell,
                GitRead, GitWrite, GitBranch, MemoryRead, MemoryWrite, NetFetch, NetSearch,
                AgentSpawn,
            ],
            Self::Subagent => &[FileRead, FileWrite, ExecSafe, MemoryRead, NetFetch, NetSearch],
            Self::Full => Capability::all(),
        };

        caps.iter()
            .map(|cap| {
                CapabilityGrant::new(
                    *cap,
                    CapabilityScope::unrestricted(),
                    GrantedBy::Profile(self.as_str().to_string()),
                    format!("default grant for {} profile", self.as_str()),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readonly_has_seven_capabilities() {
        assert_eq!(Profile::Readonly.default_grants().len(), 7);
    }

    #[test]
    fn developer_has_fourteen_capabilities() {
        assert_eq!(Profile::Developer.default_grants().len(), 14);
    }

    #[test]
    fn autonomous_has_sixteen_capabilities_including_exec_shell() {
        let grants = Profile::Autonomous.default_grants();
        assert_eq!(grants.len(), 16);
        assert!(grants.iter().any(|g| g.capability == Capability::ExecShell));
    }

    #[test]
    fn subagent_has_six_capabilities() {
        assert_eq!(Profile::Subagent.default_grants().len(), 6);
    }

    #[test]
    fn full_has_every_capability() {
        assert_eq!(Profile::Full.default_grants().len(), Capability::all().len());
    }
}
