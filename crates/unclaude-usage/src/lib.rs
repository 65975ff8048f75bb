//! Usage & budget tracker (C10, spec §4.10): persistent per-call cost
//! accounting backed by the embedded relational store, period aggregation,
//! and budget enforcement consulted by the daemon before every LLM call.

#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod budget;
mod error;
mod pricing;
mod record;
mod tracker;

pub use budget::{Budget, BudgetAction, BudgetCheck, BudgetPeriod};
pub use error::{UsageError, UsageResult};
pub use pricing::estimate_cost;
pub use record::{Period, UsageRecord, UsageSummary};
pub use tracker::UsageTracker;
