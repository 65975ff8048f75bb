//! Signed delegations (spec §3 Delegation, §4.5): one link in the chain from
//! the owner down to a session or subagent identity.
//!
//! Signing follows the teacher's versioned-canonical-serialization pattern
//! (`astrid-capabilities::token::CapabilityToken::signing_data`): a version
//! byte, length-prefixed variable fields, fixed-size fields inlined.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use unclaude_core::Timestamp;
use unclaude_crypto::{CryptoResult, KeyPair, PublicKey, Signature};

const SIGNING_DATA_VERSION: u8 = 0x01;

#[allow(clippy::cast_possible_truncation)]
fn write_length_prefixed(data: &mut Vec<u8>, bytes: &[u8]) {
    data.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    data.extend_from_slice(bytes);
}

/// A signed grant of `capabilities` from `from_identity` to `to_identity`,
/// valid until `expires` and bounding how many further links may be chained
/// beneath it (`max_chain_depth`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delegation {
    /// Unique ID for this delegation link.
    pub id: Uuid,
    /// ID of the identity granting the capabilities.
    pub from_identity: String,
    /// ID of the identity receiving the capabilities.
    pub to_identity: String,
    /// Public key of the signer (`from_identity`'s key), needed to verify
    /// without a separate identity lookup.
    pub signer_public_key: PublicKey,
    /// URI-style capability strings granted by this link.
    pub capabilities: Vec<String>,
    /// When this link was minted.
    pub issued_at: Timestamp,
    /// When this link stops being valid.
    pub expires: Timestamp,
    /// How many more links may be chained beneath this one.
    pub max_chain_depth: u32,
    /// Signature over [`Delegation::signing_data`].
    pub signature: Signature,
}

impl Delegation {
    /// Mint and sign a new delegation.
    #[must_use]
    pub fn new(
        from_identity: impl Into<String>,
        to_identity: impl Into<String>,
        signer: &KeyPair,
        capabilities: Vec<String>,
        ttl: Duration,
        max_chain_depth: u32,
    ) -> Self {
        let issued_at = Timestamp::now();
        #[allow(clippy::arithmetic_side_effects)]
        let expires = Timestamp::from_datetime(Utc::now() + ttl);

        let mut delegation = Self {
            id: Uuid::new_v4(),
            from_identity: from_identity.into(),
            to_identity: to_identity.into(),
            signer_public_key: signer.export_public_key(),
            capabilities,
            issued_at,
            expires,
            max_chain_depth,
            signature: signer.sign(&[]),
        };
        let signing_data = delegation.signing_data();
        delegation.signature = signer.sign(&signing_data);
        delegation
    }

    /// The data covered by [`Delegation::signature`] (version 1):
    /// - 1 byte: version
    /// - length-prefixed delegation ID
    /// - length-prefixed `from_identity`
    /// - length-prefixed `to_identity`
    /// - 32 bytes: signer public key
    /// - 4 bytes: capability count, then each length-prefixed
    /// - 8 bytes: `issued_at` (i64 LE)
    /// - 8 bytes: `expires` (i64 LE)
    /// - 4 bytes: `max_chain_depth` (u32 LE)
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn signing_data(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(256);
        data.push(SIGNING_DATA_VERSION);
        write_length_prefixed(&mut data, self.id.as_bytes());
        write_length_prefixed(&mut data, self.from_identity.as_bytes());
        write_length_prefixed(&mut data, self.to_identity.as_bytes());
        data.extend_from_slice(self.signer_public_key.as_bytes());
        data.extend_from_slice(&(self.capabilities.len() as u32).to_le_bytes());
        for cap in &self.capabilities {
            write_length_prefixed(&mut data, cap.as_bytes());
        }
        data.extend_from_slice(&self.issued_at.0.timestamp().to_le_bytes());
        data.extend_from_slice(&self.expires.0.timestamp().to_le_bytes());
        data.extend_from_slice(&self.max_chain_depth.to_le_bytes());
        data
    }

    /// Verify the signature against the embedded signer public key.
    ///
    /// # Errors
    ///
    /// Returns a crypto error if the signature doesn't verify.
    pub fn verify_signature(&self) -> CryptoResult<()> {
        let signing_data = self.signing_data();
        self.signer_public_key.verify(&signing_data, &self.signature)
    }

    /// Whether this link has passed its `expires` timestamp.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        let expires: DateTime<Utc> = self.expires.into();
        Utc::now() > expires
    }

    /// Remaining time until `expires`, or a zero duration if already expired.
    #[must_use]
    pub fn remaining_ttl(&self) -> Duration {
        let expires: DateTime<Utc> = self.expires.into();
        let remaining = expires - Utc::now();
        if remaining < Duration::zero() {
            Duration::zero()
        } else {
            remaining
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_verifies_against_unmodified_delegation() {
        let signer = KeyPair::generate();
        let delegation = Delegation::new(
            "owner",
            "root",
            &signer,
            vec!["*".to_string()],
            Duration::days(365),
            5,
        );
        assert!(delegation.verify_signature().is_ok());
    }

    #[test]
    fn signature_fails_if_capabilities_are_tampered() {
        let signer = KeyPair::generate();
        let mut delegation = Delegation::new(
            "owner",
            "root",
            &signer,
            vec!["file:read".to_string()],
            Duration::days(1),
            3,
        );
        delegation.capabilities.push("shell:*".to_string());
        assert!(delegation.verify_signature().is_err());
    }

    #[test]
    fn fresh_delegation_is_not_expired() {
        let signer = KeyPair::generate();
        let delegation = Delegation::new("owner", "root", &signer, vec!["*".to_string()], Duration::days(1), 5);
        assert!(!delegation.is_expired());
    }

    #[test]
    fn zero_ttl_delegation_is_expired() {
        let signer = KeyPair::generate();
        let delegation = Delegation::new(
            "owner",
            "root",
            &signer,
            vec!["*".to_string()],
            Duration::seconds(-1),
            5,
        );
        assert!(delegation.is_expired());
    }
}
