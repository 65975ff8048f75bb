//! Fixed capability and TTL tables for delegation profiles (spec §4.5,
//! carried verbatim from `auth/pact_identity.py`'s `PROFILE_CAPABILITIES` and
//! `SESSION_TTLS`).
//!
//! These are URI-style capability strings (`"file:read"`, `"shell:*"`) minted
//! onto delegations — a distinct namespace from
//! [`unclaude_capabilities::Capability::as_str`]'s dotted form used by the
//! policy engine. The original keeps the two separate, and so do we: a
//! delegation's capability list describes what a session was *handed down*,
//! while the policy engine's capability set describes what it can *actually
//! invoke right now*.

use chrono::Duration;

/// Capabilities granted by each named profile, in declaration order.
#[must_use]
pub fn profile_capabilities(profile: &str) -> Vec<String> {
    let caps: &[&str] = match profile {
        "readonly" => &["file:read", "memory:read", "context:read"],
        "developer" => &[
            "file:read",
            "file:write",
            "file:create",
            "shell:execute",
            "memory:read",
            "memory:write",
            "context:read",
            "context:write",
            "network:fetch",
        ],
        "full" => &[
            "file:*",
            "shell:*",
            "memory:*",
            "context:*",
            "network:*",
            "process:*",
        ],
        "autonomous" => &[
            "file:*",
            "shell:*",
            "memory:*",
            "context:*",
            "network:*",
            "process:*",
            "daemon:*",
            "task:*",
        ],
        "subagent" => &["file:read", "file:write", "shell:execute", "memory:read"],
        // Unknown profile names fall back to developer, matching the original's
        // `PROFILE_CAPABILITIES.get(profile, PROFILE_CAPABILITIES["developer"])`.
        _ => return profile_capabilities("developer"),
    };
    caps.iter().map(|s| (*s).to_string()).collect()
}

/// Default delegation TTL for a session type, before any caller override.
#[must_use]
pub fn default_ttl_for_session_type(session_type: &str) -> Duration {
    match session_type {
        "interactive" => Duration::hours(8),
        "autonomous" => Duration::hours(24),
        "subagent" => Duration::hours(1),
        "api" => Duration::days(30),
        "daemon" => Duration::days(7),
        _ => Duration::hours(8),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_profile_falls_back_to_developer() {
        assert_eq!(profile_capabilities("bogus"), profile_capabilities("developer"));
    }

    #[test]
    fn full_profile_uses_wildcard_capabilities() {
        assert!(profile_capabilities("full").contains(&"shell:*".to_string()));
    }

    #[test]
    fn subagent_default_ttl_is_one_hour() {
        assert_eq!(default_ttl_for_session_type("subagent"), Duration::hours(1));
    }

    #[test]
    fn unknown_session_type_defaults_to_eight_hours() {
        assert_eq!(default_ttl_for_session_type("bogus"), Duration::hours(8));
    }
}
