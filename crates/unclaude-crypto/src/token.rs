//! Random token generation for capability set handles (spec §3 Capability Set:
//! "a 32-byte URL-safe random string whose SHA-256 is stored for lookup").

use base64::Engine;
use rand::RngCore;
use rand::rngs::OsRng;

use crate::hash::ContentHash;

/// A plaintext bearer token, returned once at creation time and never
/// persisted in plaintext. Only its [`ContentHash`] is stored.
#[derive(Clone)]
pub struct PlaintextToken(String);

impl PlaintextToken {
    /// Generate a fresh 32-byte URL-safe random token.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        let encoded = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes);
        Self(encoded)
    }

    /// The token's SHA-256 digest, the only form persisted on disk.
    #[must_use]
    pub fn digest(&self) -> ContentHash {
        ContentHash::hash(self.0.as_bytes())
    }

    /// Borrow the plaintext. Callers should display this exactly once.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for PlaintextToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PlaintextToken(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_unique() {
        let a = PlaintextToken::generate();
        let b = PlaintextToken::generate();
        assert_ne!(a.as_str(), b.as_str());
    }

    #[test]
    fn digest_is_stable_for_same_token() {
        let t = PlaintextToken::generate();
        assert_eq!(t.digest(), t.digest());
    }

    #[test]
    fn debug_never_prints_plaintext() {
        let t = PlaintextToken::generate();
        assert!(!format!("{t:?}").contains(t.as_str()));
    }
}
