//! Crypto error types.

use thiserror::Error;

/// Errors that can occur in key handling, signing, and verification.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// A key or signature slice had the wrong length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected byte length.
        expected: usize,
        /// Actual byte length observed.
        actual: usize,
    },

    /// Signature verification failed.
    #[error("signature verification failed")]
    SignatureVerificationFailed,

    /// Hex decoding failed.
    #[error("invalid hex encoding")]
    InvalidHexEncoding,

    /// Base64 decoding failed.
    #[error("invalid base64 encoding")]
    InvalidBase64Encoding,

    /// Underlying I/O failure (key file read/write).
    #[error("io error: {0}")]
    IoError(String),
}

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
