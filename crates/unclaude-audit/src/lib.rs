//! The audit log (C4): an append-only, idempotent trail of every
//! authorization decision, tool invocation, and lifecycle event, backed by
//! `unclaude-storage`'s embedded relational store.
//!
//! Writes are buffered and flushed every 50 entries, on an explicit
//! `flush()`, or implicitly before every `query()` — so a query never
//! misses an event that was merely buffered. `log_now()` bypasses the
//! buffer for events that must be durable immediately (e.g. before a
//! process exit).

#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod event;
mod log;
mod query;

pub use error::{AuditError, AuditResult};
pub use event::{AuditEvent, AuditEventType, UnknownEventType};
pub use log::AuditLog;
pub use query::{AuditQuery, SessionSummary};
