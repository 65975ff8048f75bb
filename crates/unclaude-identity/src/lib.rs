//! The identity manager (C5, spec §3 Identity/Delegation/Session, §4.5):
//! persistent root/owner Ed25519 identities and the delegation chains that
//! anchor every session and subagent to them.
//!
//! A standing owner→root delegation is minted once, on first `new()`, and
//! reloaded from disk thereafter (P6). Sessions and subagents extend that
//! chain with one more signed link each; `verify_session_chain` walks the
//! whole chain checking expiry, revocation, and signatures link by link.

#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod catalog;
mod chain;
mod delegation;
mod error;
mod identity;
mod keyfile;
mod manager;
mod revocation;
mod session;
mod verify;

pub use catalog::{default_ttl_for_session_type, profile_capabilities};
pub use chain::DelegationChain;
pub use delegation::Delegation;
pub use error::{ChainVerificationError, IdentityError, IdentityResult};
pub use identity::{Identity, IdentityKind};
pub use manager::{IdentityCard, IdentityCardEntry, IdentityManager};
pub use revocation::{Revocation, RevocationStore};
pub use session::{Session, SessionDescriptor, SessionType};
pub use verify::verify_chain;
