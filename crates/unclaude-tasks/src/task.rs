//! The `Task` record (spec §3 Task).

use serde::{Deserialize, Serialize};
use unclaude_core::{Priority, Timestamp};

/// A task's lifecycle state (spec §3 Task `status`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting to be popped.
    Queued,
    /// Currently being executed by the daemon.
    Running,
    /// Finished successfully.
    Completed,
    /// Exhausted its retry budget.
    Failed,
    /// Cancelled before completion.
    Cancelled,
    /// Failed but re-queued for another attempt.
    Retrying,
}

impl TaskStatus {
    /// Whether a task in this status is eligible to be popped.
    #[must_use]
    pub const fn is_poppable(self) -> bool {
        matches!(self, Self::Queued | Self::Retrying)
    }
}

/// A queued unit of agent work (spec §3 Task).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Short hash identifier.
    pub task_id: String,
    /// Human-readable description, also the prompt seed for the agent loop.
    pub description: String,
    /// Scheduling priority.
    pub priority: Priority,
    /// Current lifecycle state.
    pub status: TaskStatus,
    /// What enqueued this task (`"cli"`, `"proactive:<name>"`, `"watcher:tasks_md"`, ...).
    pub source: String,
    /// Project directory this task runs against.
    pub project_path: String,
    /// Final result text, set on completion.
    #[serde(default)]
    pub result: Option<String>,
    /// Final error message, set on failure.
    #[serde(default)]
    pub error: Option<String>,
    /// Agent loop iterations consumed.
    #[serde(default)]
    pub iterations: u32,
    /// Total LLM cost attributed to this task.
    #[serde(default)]
    pub cost_usd: f64,
    /// When the task was pushed.
    pub created_at: Timestamp,
    /// When the task most recently transitioned to `running`.
    #[serde(default)]
    pub started_at: Option<Timestamp>,
    /// When the task reached a terminal state.
    #[serde(default)]
    pub completed_at: Option<Timestamp>,
    /// Number of retry attempts already made.
    #[serde(default)]
    pub retry_count: u32,
    /// Maximum retry attempts before giving up permanently.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

const fn default_max_retries() -> u32 {
    3
}

impl Task {
    /// Build a freshly-queued task.
    #[must_use]
    pub fn new(description: impl Into<String>, priority: Priority, source: impl Into<String>, project_path: impl Into<String>) -> Self {
        Self {
            task_id: unclaude_core::TaskId::new().to_string(),
            description: description.into(),
            priority,
            status: TaskStatus::Queued,
            source: source.into(),
            project_path: project_path.into(),
            result: None,
            error: None,
            iterations: 0,
            cost_usd: 0.0,
            created_at: Timestamp::now(),
            started_at: None,
            completed_at: None,
            retry_count: 0,
            max_retries: default_max_retries(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_is_queued_with_zero_counters() {
        let task = Task::new("do the thing", Priority::Normal, "cli", "/tmp/proj");
        assert_eq!(task.status, TaskStatus::Queued);
        assert_eq!(task.retry_count, 0);
        assert_eq!(task.max_retries, 3);
        assert!(task.result.is_none());
    }

    #[test]
    fn queued_and_retrying_are_poppable_others_are_not() {
        assert!(TaskStatus::Queued.is_poppable());
        assert!(TaskStatus::Retrying.is_poppable());
        assert!(!TaskStatus::Running.is_poppable());
        assert!(!TaskStatus::Completed.is_poppable());
        assert!(!TaskStatus::Failed.is_poppable());
        assert!(!TaskStatus::Cancelled.is_poppable());
    }
}
