//! The daemon runtime (C8, spec §4.8): the hardest subsystem in the
//! security core. Ties every other pillar together into one long-running
//! process — pops tasks from the queue, drives the agent iteration loop
//! against the external LLM client, enforces policy on every tool call,
//! detects stuck loops, enforces budgets, and self-schedules proactive
//! behaviors and file-watcher tasks.
//!
//! Library modules only; the process entry points live in the
//! `unclauded` binary crate, which constructs a [`DaemonRuntime`] and calls
//! [`DaemonRuntime::run`].

#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod agent_loop;
mod error;
mod pidfile;
mod proactive;
mod runtime;
mod status;
mod stuck;
mod watcher;

pub use agent_loop::{IterationOutcome, TaskOutcome};
pub use error::{DaemonError, DaemonResult};
pub use pidfile::{is_running, pid_file_path, process_is_alive, read_pid_file, remove_pid_file, write_pid_file};
pub use proactive::ProactiveEngine;
pub use runtime::{DaemonHandle, DaemonRuntime, RuntimeConfig};
pub use status::{read_status_file, DaemonState, StatusFile, StatusTracker};
pub use stuck::{StuckDetector, StuckSignal, BAIL_SENTINEL};
pub use watcher::{TaskFileWatcher, TasksMarkdownWatcher};
