//! The session store (C6, spec §3 Conversation Session/Session Message,
//! §4.6): one append-only, line-delimited-JSON log per conversation under
//! `<sessions_dir>/<agent_id>_<session_id>.log`.
//!
//! Appends are single atomic writes (I8/R2); compaction rewrites the whole
//! file atomically (write-temp-then-rename) and always preserves the last
//! `keep_recent` messages intact, extending the kept window when a
//! `tool_calls` unit would otherwise be split (I8).

#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod message;
mod session;
mod store;

pub use error::{SessionStoreError, SessionStoreResult};
pub use message::SessionMessage;
pub use session::{ConversationSession, SessionKey, SessionSummary};
pub use store::SessionStore;
