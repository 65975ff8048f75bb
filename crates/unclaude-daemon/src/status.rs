//! The daemon's state machine and the status file external CLIs read
//! (spec §4.8, §6).

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;

use crate::error::DaemonResult;

/// `stopped → starting → running → idle ↔ processing → stopping → stopped`,
/// with `error` reachable from any running state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DaemonState {
    /// Not yet started.
    Stopped,
    /// Opening state files and identity, before the main loop begins.
    Starting,
    /// The main loop is running but the exact idle/processing phase hasn't
    /// been reported yet.
    Running,
    /// No tasks in flight and none queued.
    Idle,
    /// At least one task is executing.
    Processing,
    /// Shutdown has been requested; in-flight tasks are being cancelled.
    Stopping,
    /// A fatal error ended the daemon.
    Error,
}

/// The JSON document written to `<state_dir>/status.json` (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusFile {
    /// Current state machine phase.
    pub status: DaemonState,
    /// Process id of the running daemon, if started.
    pub pid: u32,
    /// Project directory the daemon was launched against.
    pub project_path: PathBuf,
    /// When the daemon started.
    pub started_at: DateTime<Utc>,
    /// Total completed tasks since start.
    pub tasks_completed: u64,
    /// Total failed tasks since start.
    pub tasks_failed: u64,
    /// Total cost (USD) incurred since start.
    pub total_cost_usd: f64,
    /// Number of tasks currently queued.
    pub queue_pending: usize,
    /// Number of tasks currently executing.
    pub active_tasks: usize,
    /// When this file was last written.
    pub updated_at: DateTime<Utc>,
}

/// In-memory counters mirrored to the status file on each `persist` call.
/// Cheap to update from multiple concurrently-running tasks.
pub struct StatusTracker {
    path: PathBuf,
    project_path: PathBuf,
    pid: u32,
    started_at: DateTime<Utc>,
    state: RwLock<DaemonState>,
    tasks_completed: AtomicU64,
    tasks_failed: AtomicU64,
    total_cost_usd_cents: AtomicU64,
    queue_pending: AtomicU32,
    active_tasks: AtomicU32,
}

impl StatusTracker {
    /// Build a tracker that will persist to `<state_dir>/status.json`.
    #[must_use]
    pub fn new(state_dir: impl Into<PathBuf>, project_path: impl Into<PathBuf>, pid: u32) -> Arc<Self> {
        Arc::new(Self {
            path: state_dir.into().join("status.json"),
            project_path: project_path.into(),
            pid,
            started_at: Utc::now(),
            state: RwLock::new(DaemonState::Starting),
            tasks_completed: AtomicU64::new(0),
            tasks_failed: AtomicU64::new(0),
            total_cost_usd_cents: AtomicU64::new(0),
            queue_pending: AtomicU32::new(0),
            active_tasks: AtomicU32::new(0),
        })
    }

    /// Path to the status file this tracker persists to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Move to a new state machine phase.
    pub async fn set_state(&self, state: DaemonState) {
        *self.state.write().await = state;
    }

    /// Record a task completion (or failure) and its cost.
    pub fn record_task_outcome(&self, succeeded: bool, cost_usd: f64) {
        if succeeded {
            self.tasks_completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.tasks_failed.fetch_add(1, Ordering::Relaxed);
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let cents = (cost_usd * 100.0).round() as u64;
        self.total_cost_usd_cents.fetch_add(cents, Ordering::Relaxed);
    }

    /// Update the queue/active-task gauges.
    pub fn set_gauges(&self, queue_pending: usize, active_tasks: usize) {
        self.queue_pending
            .store(queue_pending.min(u32::MAX as usize) as u32, Ordering::Relaxed);
        self.active_tasks
            .store(active_tasks.min(u32::MAX as usize) as u32, Ordering::Relaxed);
    }

    /// Snapshot the current counters into a `StatusFile`.
    pub async fn snapshot(&self) -> StatusFile {
        StatusFile {
            status: *self.state.read().await,
            pid: self.pid,
            project_path: self.project_path.clone(),
            started_at: self.started_at,
            tasks_completed: self.tasks_completed.load(Ordering::Relaxed),
            tasks_failed: self.tasks_failed.load(Ordering::Relaxed),
            total_cost_usd: self.total_cost_usd_cents.load(Ordering::Relaxed) as f64 / 100.0,
            queue_pending: self.queue_pending.load(Ordering::Relaxed) as usize,
            active_tasks: self.active_tasks.load(Ordering::Relaxed) as usize,
            updated_at: Utc::now(),
        }
    }

    /// Write the current snapshot to disk, atomically (write-temp then
    /// rename, matching the session store's compaction pattern).
    pub async fn persist(&self) -> DaemonResult<()> {
        let snapshot = self.snapshot().await;
        let body = serde_json::to_vec_pretty(&snapshot)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, &body).await?;
        fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

/// Read a status file from disk, for `unclaude-cli`'s `status` command.
pub async fn read_status_file(path: &Path) -> DaemonResult<StatusFile> {
    let body = fs::read(path).await?;
    Ok(serde_json::from_slice(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn persists_and_reads_back_a_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = StatusTracker::new(dir.path(), "/project", 1234);
        tracker.set_state(DaemonState::Idle).await;
        tracker.record_task_outcome(true, 0.05);
        tracker.set_gauges(2, 1);
        tracker.persist().await.unwrap();

        let read_back = read_status_file(&tracker.path()).await.unwrap();
        assert_eq!(read_back.status, DaemonState::Idle);
        assert_eq!(read_back.tasks_completed, 1);
        assert!((read_back.total_cost_usd - 0.05).abs() < 1e-9);
        assert_eq!(read_back.queue_pending, 2);
        assert_eq!(read_back.active_tasks, 1);
    }
}
