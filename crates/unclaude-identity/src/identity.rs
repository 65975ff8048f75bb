//! The identity value type shared by root, owner, session, and subagent
//! entities (spec §3 Identity).

use serde::{Deserialize, Serialize};
use unclaude_core::Timestamp;
use unclaude_crypto::PublicKey;

/// Whether an identity belongs to a human (the owner) or an agent (root,
/// session, subagent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    /// The human operator who owns this installation.
    Human,
    /// An agent identity: the root, a session, or a subagent.
    Agent,
}

impl IdentityKind {
    /// Canonical name used in `*_meta.json` files and identity cards.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Agent => "agent",
        }
    }
}

/// A named identity: a public key plus metadata. Every session and subagent
/// is one of these, minted fresh and never persisted to disk — only the root
/// and owner identities survive a restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// Human vs. agent.
    pub kind: IdentityKind,
    /// `sha256:<hex>` derived from the public key (spec §3).
    pub id: String,
    /// The identity's Ed25519 public key.
    pub public_key: PublicKey,
    /// Human-readable name (`"unclaude-root"`, `"unclaude-owner"`, ...).
    pub name: String,
    /// When this identity was minted.
    pub created_at: Timestamp,
}

impl Identity {
    /// Build an identity from a public key, deriving its ID.
    #[must_use]
    pub fn new(kind: IdentityKind, public_key: PublicKey, name: impl Into<String>) -> Self {
        Self {
            id: public_key.identity_id(),
            kind,
            public_key,
            name: name.into(),
            created_at: Timestamp::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unclaude_crypto::KeyPair;

    #[test]
    fn id_is_derived_from_public_key() {
        let kp = KeyPair::generate();
        let pk = kp.export_public_key();
        let identity = Identity::new(IdentityKind::Agent, pk, "unclaude-root");
        assert_eq!(identity.id, pk.identity_id());
    }
}
