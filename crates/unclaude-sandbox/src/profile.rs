//! Sandbox presets (spec §3: `strict`, `standard`, `permissive`; exact
//! numbers from §3 [SUPPLEMENT], taken from the original implementation).

use crate::limits::ResourceLimits;

/// Name of a sandbox resource-limit preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SandboxProfile {
    /// Tight limits, short timeouts: used with the `readonly`/`subagent`
    /// capability profiles.
    Strict,
    /// The default preset for everyday `developer` sessions.
    Standard,
    /// Loosened limits for long-running `autonomous` sessions.
    Permissive,
}

impl SandboxProfile {
    /// Parse a preset name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "strict" => Some(Self::Strict),
            "standard" => Some(Self::Standard),
            "permissive" => Some(Self::Permissive),
            _ => None,
        }
    }

    /// Canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Standard => "standard",
            Self::Permissive => "permissive",
        }
    }

    /// The resource ceilings for this preset.
    #[must_use]
    pub const fn limits(self) -> ResourceLimits {
        match self {
            Self::Strict => ResourceLimits {
                max_file_size_bytes: 1_000_000,
                max_files_created: 20,
                max_output_size_bytes: 100_000,
                exec_timeout_seconds: 30,
                max_concurrent_processes: 2,
                max_iterations: 20,
                max_tool_calls_per_turn: 10,
                max_cost_usd: 1.0,
            },
            Self::Standard => ResourceLimits {
                max_file_size_bytes: 10_000_000,
                max_files_created: 100,
                max_output_size_bytes: 1_000_000,
                exec_timeout_seconds: 120,
                max_concurrent_processes: 5,
                max_iterations: 50,
                max_tool_calls_per_turn: 20,
                max_cost_usd: 10.0,
            },
            Self::Permissive => ResourceLimits {
                max_file_size_bytes: 100_000_000,
                max_files_created: 1_000,
                max_output_size_bytes: 10_000_000,
                exec_timeout_seconds: 300,
                max_concurrent_processes: 20,
                max_iterations: 200,
                max_tool_calls_per_turn: 50,
                max_cost_usd: 100.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_limits_match_the_original() {
        let limits = SandboxProfile::Strict.limits();
        assert_eq!(limits.max_file_size_bytes, 1_000_000);
        assert_eq!(limits.max_iterations, 20);
        assert!((limits.max_cost_usd - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn permissive_limits_are_loosest() {
        let strict = SandboxProfile::Strict.limits();
        let permissive = SandboxProfile::Permissive.limits();
        assert!(permissive.max_file_size_bytes > strict.max_file_size_bytes);
        assert!(permissive.max_cost_usd > strict.max_cost_usd);
    }
}
