//! Embedded storage for the unclaude security core: a namespaced key-value
//! store for session/task/state files and a relational store (SurrealDB,
//! SurrealKV engine) for the audit log (spec §4.4, §6).

#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod db;
mod error;
mod kv;

pub use db::Database;
pub use error::{StorageError, StorageResult};
pub use kv::{KvStore, MemoryKvStore, ScopedKvStore};
