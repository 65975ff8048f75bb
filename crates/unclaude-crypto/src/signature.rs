//! Ed25519 signature wrapper.

use ed25519_dalek::{Signature as DalekSignature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, CryptoResult};

/// An Ed25519 signature, serialized as hex.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature(DalekSignature);

impl Signature {
    /// Verify this signature over `message` against `public_key_bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyLength`] if the public key is malformed
    /// or [`CryptoError::SignatureVerificationFailed`] if verification fails.
    pub fn verify(&self, message: &[u8], public_key_bytes: &[u8; 32]) -> CryptoResult<()> {
        let verifying_key =
            VerifyingKey::from_bytes(public_key_bytes).map_err(|_| CryptoError::InvalidKeyLength {
                expected: 32,
                actual: public_key_bytes.len(),
            })?;
        verifying_key
            .verify(message, &self.0)
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }

    /// Raw 64-byte signature.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 64] {
        self.0.to_bytes()
    }

    /// Reconstruct from 64 raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyLength`] if `bytes` is not 64 bytes.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        let arr: [u8; 64] = bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: 64,
            actual: bytes.len(),
        })?;
        Ok(Self(DalekSignature::from_bytes(&arr)))
    }

    /// Hex encoding of the signature bytes.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Decode a signature from hex.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidHexEncoding`] on malformed hex.
    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(s).map_err(|_| CryptoError::InvalidHexEncoding)?;
        Self::from_bytes(&bytes)
    }
}

impl From<DalekSignature> for Signature {
    fn from(sig: DalekSignature) -> Self {
        Self(sig)
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({}...)", &self.to_hex()[..16])
    }
}

impl Serialize for Signature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypair::KeyPair;

    #[test]
    fn round_trips_through_hex() {
        let kp = KeyPair::generate();
        let sig = kp.sign(b"payload");
        let hex = sig.to_hex();
        let decoded = Signature::from_hex(&hex).unwrap();
        assert!(decoded.verify(b"payload", kp.public_key_bytes()).is_ok());
    }
}
