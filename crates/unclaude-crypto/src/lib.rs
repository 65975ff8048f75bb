//! Ed25519 identity primitives and content hashing for the unclaude security
//! core (spec §3 Identity, §4.5 Identity Manager, I5).
//!
//! Cryptography, not prompting, is the source of authorization: the root and
//! owner identities are persistent Ed25519 keypairs; sessions and subagents
//! are ephemeral keypairs chained to them by signed delegations
//! (`unclaude-identity`). This crate only provides the primitives — key
//! generation, signing, verification, content hashing, and random token
//! generation — that those higher layers compose.

#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod hash;
mod keypair;
mod signature;
mod token;

pub use error::{CryptoError, CryptoResult};
pub use hash::ContentHash;
pub use keypair::{KeyPair, PublicKey};
pub use signature::Signature;
pub use token::PlaintextToken;
