//! Resource limit configuration and the `create_file`/`spawn_process`
//! resource kind checked by `check_resource` (spec §4.2).

use serde::{Deserialize, Serialize};

/// Static resource ceilings for one sandbox policy instance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Largest single file read/write allowed, in bytes.
    pub max_file_size_bytes: u64,
    /// Lifetime cap on files created by this policy instance.
    pub max_files_created: u64,
    /// Largest tool output captured before truncation, in bytes.
    pub max_output_size_bytes: u64,
    /// Wall-clock timeout for a single exec invocation, in seconds.
    pub exec_timeout_seconds: u64,
    /// Maximum processes this policy instance may have running at once.
    pub max_concurrent_processes: u64,
    /// Maximum agent-loop iterations per task.
    pub max_iterations: u64,
    /// Maximum tool calls accepted from a single LLM response.
    pub max_tool_calls_per_turn: u64,
    /// Maximum cumulative cost (USD) for a session.
    pub max_cost_usd: f64,
}

/// A resource kind checked/consumed by `check_resource` (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Creating a new file counts against `max_files_created`.
    CreateFile,
    /// Spawning a process counts against `max_concurrent_processes`.
    SpawnProcess,
}

/// Live counters mutated by successful `check_resource` calls. Lifetime
/// totals — not decremented when a resource is released (spec §4.2).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ResourceCounters {
    /// Total files created so far.
    pub files_created_count: u64,
    /// Processes currently believed to be running.
    pub current_concurrent_processes: u64,
}
