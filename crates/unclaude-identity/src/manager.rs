//! The identity manager (C5, spec §4.5): loads or mints the persistent root
//! and owner identities, and mints/verifies/revokes the delegation chains
//! that anchor every session and subagent to them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use unclaude_crypto::KeyPair;

use crate::catalog::profile_capabilities;
use crate::chain::DelegationChain;
use crate::delegation::Delegation;
use crate::error::{IdentityError, IdentityResult};
use crate::identity::{Identity, IdentityKind};
use crate::keyfile;
use crate::revocation::RevocationStore;
use crate::session::{Session, SessionDescriptor, SessionType};
use crate::verify::verify_chain;

const OWNER_TO_ROOT_TTL_DAYS: i64 = 365;
const OWNER_TO_ROOT_MAX_CHAIN_DEPTH: u32 = 5;
const SESSION_MAX_CHAIN_DEPTH: u32 = 3; // root -> session -> subagent

/// Public, non-secret identity card (spec §4.5 `export_identity_card`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityCard {
    /// Protocol name, carried from the original's delegation protocol.
    pub protocol: String,
    /// Protocol version.
    pub version: String,
    /// The root agent identity.
    pub agent: IdentityCardEntry,
    /// The owner (human) identity.
    pub owner: IdentityCardEntry,
    /// Length of the standing owner-to-root chain.
    pub chain_length: usize,
    /// Capabilities granted by the owner-to-root delegation.
    pub capabilities: Vec<String>,
}

/// One entity's public fields within an [`IdentityCard`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityCardEntry {
    /// `"human"` or `"agent"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// `sha256:<hex>` ID.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Hex-encoded public key.
    pub public_key: String,
}

/// Manages the persistent root/owner identities and every live session.
pub struct IdentityManager {
    identity_dir: PathBuf,
    root_identity: Identity,
    root_keypair: KeyPair,
    owner_identity: Identity,
    #[allow(dead_code)]
    owner_keypair: KeyPair,
    owner_to_root_chain: DelegationChain,
    sessions: HashMap<String, Session>,
    revocations: RevocationStore,
}

impl IdentityManager {
    /// Load or initialize the root and owner identities under `identity_dir`
    /// (spec §4.5 "On init").
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError`] on I/O, serialization, or symlink failure.
    pub fn new(identity_dir: impl Into<PathBuf>) -> IdentityResult<Self> {
        let identity_dir = identity_dir.into();
        std::fs::create_dir_all(&identity_dir).map_err(|e| IdentityError::Io(e.to_string()))?;

        let (root_identity, root_keypair) = keyfile::load_or_create(
            &identity_dir.join("root_key.json"),
            &identity_dir.join("root_meta.json"),
            IdentityKind::Agent,
            "unclaude-root",
        )?;
        let (owner_identity, owner_keypair) = keyfile::load_or_create(
            &identity_dir.join("owner_key.json"),
            &identity_dir.join("owner_meta.json"),
            IdentityKind::Human,
            "unclaude-owner",
        )?;

        let owner_to_root = Delegation::new(
            owner_identity.id.clone(),
            root_identity.id.clone(),
            &owner_keypair,
            vec!["*".to_string()],
            Duration::days(OWNER_TO_ROOT_TTL_DAYS),
            OWNER_TO_ROOT_MAX_CHAIN_DEPTH,
        );
        let owner_to_root_chain = DelegationChain::new().extended_with(owner_to_root);

        Ok(Self {
            identity_dir,
            root_identity,
            root_keypair,
            owner_identity,
            owner_keypair,
            owner_to_root_chain,
            sessions: HashMap::new(),
            revocations: RevocationStore::new(),
        })
    }

    /// The identity directory this manager is rooted at.
    #[must_use]
    pub fn identity_dir(&self) -> &Path {
        &self.identity_dir
    }

    /// The persistent root identity's `sha256:<hex>` ID.
    #[must_use]
    pub fn root_id(&self) -> &str {
        &self.root_identity.id
    }

    /// Mint a new session: a fresh ephemeral keypair delegated from the root
    /// with `PROFILE_CAPABILITIES[profile]` (spec §4.5 `create_session`).
    pub fn create_session(
        &mut self,
        name: impl Into<String>,
        session_type: SessionType,
        profile: impl Into<String>,
        project_path: impl Into<String>,
        ttl: Option<Duration>,
    ) -> String {
        let profile = profile.into();
        let ttl = ttl.unwrap_or_else(|| session_type.default_ttl());
        let capabilities = profile_capabilities(&profile);

        let session_keypair = KeyPair::generate();
        let session_identity = Identity::new(
            IdentityKind::Agent,
            session_keypair.export_public_key(),
            "unclaude-session",
        );

        let root_to_session = Delegation::new(
            self.root_identity.id.clone(),
            session_identity.id.clone(),
            &self.root_keypair,
            capabilities,
            ttl,
            SESSION_MAX_CHAIN_DEPTH,
        );
        let chain = self.owner_to_root_chain.extended_with(root_to_session);

        let session = Session::new(
            session_identity,
            session_keypair,
            chain,
            name,
            session_type,
            profile,
            project_path,
            None,
        );
        let short_id = session.short_id();
        self.sessions.insert(short_id.clone(), session);
        short_id
    }

    /// Sub-delegate a narrowed set of capabilities from `parent_session_id`
    /// to a new ephemeral subagent identity (spec §4.5
    /// `create_subagent_delegation`). The TTL is capped at the parent
    /// session's remaining TTL.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::UnknownSession`] if `parent_session_id` has
    /// no open session.
    pub fn create_subagent_delegation(
        &mut self,
        parent_session_id: &str,
        capabilities: Option<Vec<String>>,
        ttl: Option<Duration>,
    ) -> IdentityResult<String> {
        let parent = self
            .sessions
            .get(parent_session_id)
            .ok_or_else(|| IdentityError::UnknownSession(parent_session_id.to_string()))?;
        let Some(parent_keypair) = parent.keypair() else {
            return Err(IdentityError::UnknownSession(parent_session_id.to_string()));
        };

        let capabilities = capabilities.unwrap_or_else(|| profile_capabilities("subagent"));
        let requested_ttl = ttl.unwrap_or_else(|| SessionType::Subagent.default_ttl());
        let ttl = requested_ttl.min(parent.remaining_ttl());

        let subagent_keypair = KeyPair::generate();
        let subagent_identity = Identity::new(
            IdentityKind::Agent,
            subagent_keypair.export_public_key(),
            "unclaude-subagent",
        );

        let delegation = Delegation::new(
            parent.identity.id.clone(),
            subagent_identity.id.clone(),
            parent_keypair,
            capabilities,
            ttl,
            SESSION_MAX_CHAIN_DEPTH,
        );
        let chain = parent.chain.extended_with(delegation);
        let parent_session_id = parent.short_id();
        let project_path = parent.project_path.clone();

        let subagent_short_id = subagent_identity.id.trim_start_matches("sha256:").chars().take(16).collect::<String>();
        let session = Session::new(
            subagent_identity,
            subagent_keypair,
            chain,
            format!("subagent-{}", &subagent_short_id[..8.min(subagent_short_id.len())]),
            SessionType::Subagent,
            "subagent",
            project_path,
            Some(parent_session_id),
        );
        let short_id = session.short_id();
        self.sessions.insert(short_id.clone(), session);
        Ok(short_id)
    }

    /// Fetch a live session by ID.
    #[must_use]
    pub fn get_session(&self, session_id: &str) -> Option<&Session> {
        self.sessions.get(session_id)
    }

    /// End a session, zeroizing its in-memory keypair.
    pub fn end_session(&mut self, session_id: &str) {
        if let Some(mut session) = self.sessions.remove(session_id) {
            session.close();
        }
    }

    /// Verify a session's delegation chain, consulting the revocation store
    /// for every link (spec §4.5 `verify_session_chain`).
    #[must_use]
    pub fn verify_session_chain(&self, session_id: &str) -> bool {
        self.verify_session_chain_detailed(session_id).is_ok()
    }

    /// As [`IdentityManager::verify_session_chain`], but reporting which
    /// link failed (spec §4.5 SUPPLEMENT).
    ///
    /// # Errors
    ///
    /// Returns the specific link-level [`crate::ChainVerificationError`].
    pub fn verify_session_chain_detailed(
        &self,
        session_id: &str,
    ) -> Result<(), crate::error::ChainVerificationError> {
        let Some(session) = self.sessions.get(session_id) else {
            return Err(crate::error::ChainVerificationError::EmptyChain);
        };
        verify_chain(&session.chain, &self.revocations)
    }

    /// Revoke a session's leaf delegation and end the session (spec §4.5
    /// `revoke_session`).
    pub fn revoke_session(&mut self, session_id: &str, reason: &str) -> bool {
        let Some(session) = self.sessions.get(session_id) else {
            return false;
        };
        if let Some(last) = session.chain.last() {
            self.revocations.revoke(last.id, reason.to_string());
        }
        self.end_session(session_id);
        true
    }

    /// List all active sessions as non-secret descriptors, first pruning
    /// any whose leaf delegation has expired (spec §4.5 `list_sessions`).
    pub fn list_sessions(&mut self) -> Vec<SessionDescriptor> {
        self.cleanup_expired();
        let root_id = self.root_identity.id.clone();
        self.sessions.values().map(|s| s.to_descriptor(&root_id)).collect()
    }

    fn cleanup_expired(&mut self) {
        let expired: Vec<String> = self
            .sessions
            .iter()
            .filter(|(_, session)| session.is_closed() || session.is_expired())
            .map(|(id, _)| id.clone())
            .collect();
        for id in expired {
            self.end_session(&id);
        }
    }

    /// Export the public identity card: no field named or containing
    /// `private`, `secret`, or `seed` (spec §4.5, P7).
    #[must_use]
    pub fn export_identity_card(&self) -> IdentityCard {
        IdentityCard {
            protocol: "unclaude-delegation".to_string(),
            version: "1.0".to_string(),
            agent: IdentityCardEntry {
                kind: self.root_identity.kind.as_str().to_string(),
                id: self.root_identity.id.clone(),
                name: self.root_identity.name.clone(),
                public_key: self.root_identity.public_key.to_hex(),
            },
            owner: IdentityCardEntry {
                kind: self.owner_identity.kind.as_str().to_string(),
                id: self.owner_identity.id.clone(),
                name: self.owner_identity.name.clone(),
                public_key: self.owner_identity.public_key.to_hex(),
            },
            chain_length: self.owner_to_root_chain.len(),
            capabilities: self.owner_to_root_chain.effective_capabilities(),
        }
    }

    /// Number of active (non-closed) sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> (tempfile::TempDir, IdentityManager) {
        let dir = tempfile::tempdir().expect("tempdir");
        let mgr = IdentityManager::new(dir.path().join("identity")).expect("new manager");
        (dir, mgr)
    }

    #[test]
    fn root_and_owner_identities_persist_across_restarts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let identity_dir = dir.path().join("identity");
        let first = IdentityManager::new(&identity_dir).expect("first");
        let second = IdentityManager::new(&identity_dir).expect("second");
        assert_eq!(first.root_id(), second.root_id());
    }

    #[test]
    fn create_session_mints_a_verifiable_chain() {
        let (_dir, mut mgr) = manager();
        let id = mgr.create_session("default", SessionType::Interactive, "developer", "/tmp/project", None);
        assert!(mgr.verify_session_chain(&id));
        let session = mgr.get_session(&id).expect("session exists");
        assert_eq!(session.chain.len(), 2);
    }

    #[test]
    fn subagent_delegation_narrows_capabilities_and_caps_ttl() {
        let (_dir, mut mgr) = manager();
        let parent_id = mgr.create_session(
            "default",
            SessionType::Subagent,
            "developer",
            "",
            Some(Duration::minutes(30)),
        );
        let sub_id = mgr
            .create_subagent_delegation(&parent_id, None, Some(Duration::hours(1)))
            .expect("subagent");
        let sub = mgr.get_session(&sub_id).expect("subagent session");
        assert!(sub.remaining_ttl() <= Duration::minutes(30));
        assert_eq!(sub.chain.len(), 3);
    }

    #[test]
    fn create_subagent_delegation_rejects_unknown_parent() {
        let (_dir, mut mgr) = manager();
        assert!(mgr.create_subagent_delegation("nonexistent", None, None).is_err());
    }

    #[test]
    fn revoke_session_invalidates_the_chain_and_ends_it() {
        let (_dir, mut mgr) = manager();
        let id = mgr.create_session("default", SessionType::Interactive, "developer", "", None);
        assert!(mgr.revoke_session(&id, "manual"));
        assert!(mgr.get_session(&id).is_none());
    }

    #[test]
    fn list_sessions_prunes_expired_entries() {
        let (_dir, mut mgr) = manager();
        mgr.create_session(
            "default",
            SessionType::Interactive,
            "developer",
            "",
            Some(Duration::seconds(-1)),
        );
        assert!(mgr.list_sessions().is_empty());
        assert_eq!(mgr.session_count(), 0);
    }

    #[test]
    fn end_session_zeroizes_key_and_removes_from_active_list() {
        let (_dir, mut mgr) = manager();
        let id = mgr.create_session("default", SessionType::Interactive, "developer", "", None);
        assert_eq!(mgr.session_count(), 1);
        mgr.end_session(&id);
        assert_eq!(mgr.session_count(), 0);
    }

    #[test]
    fn identity_card_contains_no_secret_material() {
        let (_dir, mgr) = manager();
        let card = mgr.export_identity_card();
        let json = serde_json::to_string(&card).expect("serialize");
        let lower = json.to_lowercase();
        assert!(!lower.contains("private"));
        assert!(!lower.contains("secret"));
        assert!(!lower.contains("seed"));
        assert_eq!(card.capabilities, vec!["*".to_string()]);
    }
}
