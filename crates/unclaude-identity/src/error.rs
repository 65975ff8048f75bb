//! Identity manager error types.

use std::path::PathBuf;

use thiserror::Error;

use unclaude_crypto::CryptoError;

/// Errors from identity persistence, session management, and delegation.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Underlying I/O failure reading or writing identity files.
    #[error("io error: {0}")]
    Io(String),

    /// A key or meta file failed to (de)serialize.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A cryptographic operation failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// An identity file path was a symlink; refused to follow it.
    #[error("refusing to read identity file: {0:?} is a symlink")]
    SymlinkRejected(PathBuf),

    /// No session exists with the given ID.
    #[error("unknown session: {0}")]
    UnknownSession(String),
}

/// Result type for identity manager operations.
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Why a delegation chain failed verification, with enough granularity to
/// name the offending link (spec §4.5 SUPPLEMENT: the original short-circuits
/// on the first invalid link and reports which one).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainVerificationError {
    /// The chain has no delegations at all.
    #[error("delegation chain is empty")]
    EmptyChain,

    /// Link at `index` has expired.
    #[error("delegation at chain index {index} has expired")]
    ExpiredDelegation {
        /// Zero-based position of the expired link.
        index: usize,
    },

    /// Link at `index` has been revoked.
    #[error("delegation {delegation_id} at chain index {index} has been revoked")]
    RevokedDelegation {
        /// Zero-based position of the revoked link.
        index: usize,
        /// The revoked delegation's ID.
        delegation_id: String,
    },

    /// Link at `index` carries a signature that doesn't verify.
    #[error("delegation at chain index {index} has an invalid signature")]
    BadSignature {
        /// Zero-based position of the bad link.
        index: usize,
    },
}
