//! The persistent task queue (C7, spec §3 Task, §4.7): a single JSON file
//! under `<state_dir>/task_queue.json` holding every task the daemon has
//! ever queued.
//!
//! The queue assumes a single writer (the daemon) but tolerates producers
//! pushing tasks from other process instances — `pop` always reloads from
//! disk first (P9), and every mutation rewrites the file atomically
//! (write-temp-then-rename).

#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod queue;
mod task;

pub use error::{TaskQueueError, TaskQueueResult};
pub use queue::TaskQueue;
pub use task::{Task, TaskStatus};
