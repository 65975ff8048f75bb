//! Delegation chain verification (spec §4.5 `verify_session_chain`,
//! §8 P6–P8).

use crate::chain::DelegationChain;
use crate::error::ChainVerificationError;
use crate::revocation::RevocationStore;

/// Verify every link in `chain`: signature valid, not expired, not revoked.
/// Short-circuits on the first invalid link and reports which one (spec
/// §4.5 SUPPLEMENT), mirroring the original's `verify_chain`.
///
/// # Errors
///
/// Returns the specific [`ChainVerificationError`] for the first link that
/// fails verification.
pub fn verify_chain(chain: &DelegationChain, revocations: &RevocationStore) -> Result<(), ChainVerificationError> {
    if chain.is_empty() {
        return Err(ChainVerificationError::EmptyChain);
    }

    for (index, link) in chain.links().iter().enumerate() {
        if link.verify_signature().is_err() {
            return Err(ChainVerificationError::BadSignature { index });
        }
        if link.is_expired() {
            return Err(ChainVerificationError::ExpiredDelegation { index });
        }
        if revocations.is_revoked(link.id) {
            return Err(ChainVerificationError::RevokedDelegation {
                index,
                delegation_id: link.id.to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegation::Delegation;
    use chrono::Duration;
    use unclaude_crypto::KeyPair;

    #[test]
    fn empty_chain_is_rejected() {
        let chain = DelegationChain::new();
        let revocations = RevocationStore::new();
        assert_eq!(verify_chain(&chain, &revocations), Err(ChainVerificationError::EmptyChain));
    }

    #[test]
    fn valid_chain_passes() {
        let signer = KeyPair::generate();
        let link = Delegation::new("owner", "root", &signer, vec!["*".to_string()], Duration::days(365), 5);
        let chain = DelegationChain::new().extended_with(link);
        let revocations = RevocationStore::new();
        assert!(verify_chain(&chain, &revocations).is_ok());
    }

    #[test]
    fn expired_link_is_rejected() {
        let signer = KeyPair::generate();
        let link = Delegation::new("owner", "root", &signer, vec!["*".to_string()], Duration::seconds(-1), 5);
        let chain = DelegationChain::new().extended_with(link);
        let revocations = RevocationStore::new();
        assert!(matches!(
            verify_chain(&chain, &revocations),
            Err(ChainVerificationError::ExpiredDelegation { index: 0 })
        ));
    }

    #[test]
    fn revoked_link_is_rejected() {
        let signer = KeyPair::generate();
        let link = Delegation::new("owner", "root", &signer, vec!["*".to_string()], Duration::days(365), 5);
        let link_id = link.id;
        let chain = DelegationChain::new().extended_with(link);
        let mut revocations = RevocationStore::new();
        revocations.revoke(link_id, "manual");
        assert!(matches!(
            verify_chain(&chain, &revocations),
            Err(ChainVerificationError::RevokedDelegation { index: 0, .. })
        ));
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let signer = KeyPair::generate();
        let mut link = Delegation::new("owner", "root", &signer, vec!["*".to_string()], Duration::days(365), 5);
        link.capabilities.push("shell:*".to_string());
        let chain = DelegationChain::new().extended_with(link);
        let revocations = RevocationStore::new();
        assert!(matches!(
            verify_chain(&chain, &revocations),
            Err(ChainVerificationError::BadSignature { index: 0 })
        ));
    }
}
