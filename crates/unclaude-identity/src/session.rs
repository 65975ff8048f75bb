//! Session handles (spec §3 Session, §4.5 `create_session`): an ephemeral
//! identity plus the delegation chain anchoring it to the root.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use unclaude_core::{SessionId, Timestamp};
use unclaude_crypto::KeyPair;

use crate::chain::DelegationChain;
use crate::delegation::Delegation;
use crate::identity::Identity;

/// The kind of session being created, selecting a default TTL (spec §4.5
/// `SESSION_TTLS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    /// A human-driven interactive session. Default TTL 8h.
    Interactive,
    /// A long-running autonomous daemon task. Default TTL 24h.
    Autonomous,
    /// A spawned subagent. Default TTL 1h.
    Subagent,
    /// A programmatic API caller. Default TTL 30d.
    Api,
    /// The daemon's own standing session. Default TTL 7d.
    Daemon,
}

impl SessionType {
    /// Parse from the wire/config name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "interactive" => Some(Self::Interactive),
            "autonomous" => Some(Self::Autonomous),
            "subagent" => Some(Self::Subagent),
            "api" => Some(Self::Api),
            "daemon" => Some(Self::Daemon),
            _ => None,
        }
    }

    /// Canonical wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Interactive => "interactive",
            Self::Autonomous => "autonomous",
            Self::Subagent => "subagent",
            Self::Api => "api",
            Self::Daemon => "daemon",
        }
    }

    /// Default delegation TTL for this session type (spec §4.5 `SESSION_TTLS`).
    #[must_use]
    pub fn default_ttl(self) -> Duration {
        crate::catalog::default_ttl_for_session_type(self.as_str())
    }
}

/// A non-secret snapshot of a session, suitable for `list_sessions()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDescriptor {
    /// The session's short ID.
    pub session_id: String,
    /// Human-readable name.
    pub name: String,
    /// Kind of session.
    pub session_type: SessionType,
    /// Capability profile the session was created with.
    pub profile: String,
    /// The session identity's `sha256:<hex>` ID.
    pub identity_id: String,
    /// The root identity's `sha256:<hex>` ID.
    pub root_id: String,
    /// Capabilities in effect at the chain's leaf.
    pub capabilities: Vec<String>,
    /// When the session was created.
    pub created_at: Timestamp,
    /// When the session was last active.
    pub last_active: Timestamp,
    /// Project directory this session is scoped to.
    pub project_path: String,
    /// Number of links in the delegation chain.
    pub chain_depth: usize,
}

/// A live session: an ephemeral keypair chained to the root by signed
/// delegations. The keypair is zeroized when the session ends.
pub struct Session {
    /// Short, stable session ID (first 16 chars of the identity's ID).
    pub id: SessionId,
    /// This session's ephemeral identity.
    pub identity: Identity,
    /// The session's ephemeral signing key, `None` once [`Session::close`] has run.
    keypair: Option<KeyPair>,
    /// The chain anchoring this session to the root.
    pub chain: DelegationChain,
    /// Human-readable name.
    pub name: String,
    /// Kind of session.
    pub session_type: SessionType,
    /// Capability profile.
    pub profile: String,
    /// Project directory this session is scoped to.
    pub project_path: String,
    /// When this session was created.
    pub created_at: Timestamp,
    /// When this session was last touched.
    pub last_active: Timestamp,
    /// Whether [`Session::close`] has run.
    closed: bool,
    /// The parent session's ID, set only for subagent delegations.
    pub parent_session_id: Option<String>,
}

impl Session {
    /// Build a new, open session handle.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        identity: Identity,
        keypair: KeyPair,
        chain: DelegationChain,
        name: impl Into<String>,
        session_type: SessionType,
        profile: impl Into<String>,
        project_path: impl Into<String>,
        parent_session_id: Option<String>,
    ) -> Self {
        let id = SessionId::new();
        let now = Timestamp::now();
        Self {
            id,
            identity,
            keypair: Some(keypair),
            chain,
            name: name.into(),
            session_type,
            profile: profile.into(),
            project_path: project_path.into(),
            created_at: now,
            last_active: now,
            closed: false,
            parent_session_id,
        }
    }

    /// Short ID derived from the identity's `sha256:<hex>` ID (spec §4.5:
    /// `pact_session.identity.id[:16]`).
    #[must_use]
    pub fn short_id(&self) -> String {
        let digest = self.identity.id.trim_start_matches("sha256:");
        digest.chars().take(16).collect()
    }

    /// Update `last_active` to now.
    pub fn touch(&mut self) {
        self.last_active = Timestamp::now();
    }

    /// Whether [`Session::close`] has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// End the session, zeroizing the in-memory keypair.
    pub fn close(&mut self) {
        self.keypair = None;
        self.closed = true;
    }

    /// The ephemeral keypair, if the session is still open.
    #[must_use]
    pub fn keypair(&self) -> Option<&KeyPair> {
        self.keypair.as_ref()
    }

    /// Remaining TTL on the chain's leaf delegation.
    #[must_use]
    pub fn remaining_ttl(&self) -> Duration {
        self.chain.last().map(Delegation::remaining_ttl).unwrap_or_else(Duration::zero)
    }

    /// Whether the chain's leaf delegation has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.chain.last().is_none_or(Delegation::is_expired)
    }

    /// A non-secret snapshot for `list_sessions()`.
    #[must_use]
    pub fn to_descriptor(&self, root_id: &str) -> SessionDescriptor {
        SessionDescriptor {
            session_id: self.short_id(),
            name: self.name.clone(),
            session_type: self.session_type,
            profile: self.profile.clone(),
            identity_id: self.identity.id.clone(),
            root_id: root_id.to_string(),
            capabilities: self.chain.effective_capabilities(),
            created_at: self.created_at,
            last_active: self.last_active,
            project_path: self.project_path.clone(),
            chain_depth: self.chain.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityKind;
    use unclaude_crypto::KeyPair;

    fn test_session() -> Session {
        let kp = KeyPair::generate();
        let identity = Identity::new(IdentityKind::Agent, kp.export_public_key(), "unclaude-session");
        let signer = KeyPair::generate();
        let link = Delegation::new("root", &identity.id, &signer, vec!["file:read".to_string()], Duration::hours(8), 3);
        let chain = DelegationChain::new().extended_with(link);
        Session::new(identity, kp, chain, "default", SessionType::Interactive, "developer", "", None)
    }

    #[test]
    fn close_zeroizes_keypair_and_marks_closed() {
        let mut session = test_session();
        assert!(session.keypair().is_some());
        session.close();
        assert!(session.keypair().is_none());
        assert!(session.is_closed());
    }

    #[test]
    fn short_id_is_sixteen_chars() {
        let session = test_session();
        assert_eq!(session.short_id().len(), 16);
    }

    #[test]
    fn fresh_session_is_not_expired() {
        let session = test_session();
        assert!(!session.is_expired());
    }
}
