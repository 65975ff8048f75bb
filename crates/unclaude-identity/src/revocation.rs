//! In-memory revocation store consulted during chain verification (spec
//! §4.5 `revoke_session`/`verify_session_chain`).

use std::collections::HashMap;

use unclaude_core::Timestamp;
use uuid::Uuid;

/// One revocation entry: a delegation ID, who revoked it, why, and when.
#[derive(Debug, Clone)]
pub struct Revocation {
    /// The revoked delegation's ID.
    pub delegation_id: Uuid,
    /// Human-readable reason.
    pub reason: String,
    /// When the revocation was recorded.
    pub revoked_at: Timestamp,
}

/// Tracks revoked delegation IDs so chain verification can reject links
/// that were valid when minted but have since been revoked.
#[derive(Debug, Default)]
pub struct RevocationStore {
    entries: HashMap<Uuid, Revocation>,
}

impl RevocationStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a revocation.
    pub fn revoke(&mut self, delegation_id: Uuid, reason: impl Into<String>) {
        self.entries.insert(
            delegation_id,
            Revocation {
                delegation_id,
                reason: reason.into(),
                revoked_at: Timestamp::now(),
            },
        );
    }

    /// Whether `delegation_id` has been revoked.
    #[must_use]
    pub fn is_revoked(&self, delegation_id: Uuid) -> bool {
        self.entries.contains_key(&delegation_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrevoked_id_is_not_revoked() {
        let store = RevocationStore::new();
        assert!(!store.is_revoked(Uuid::new_v4()));
    }

    #[test]
    fn revoked_id_is_reported_revoked() {
        let mut store = RevocationStore::new();
        let id = Uuid::new_v4();
        store.revoke(id, "manual");
        assert!(store.is_revoked(id));
    }
}
