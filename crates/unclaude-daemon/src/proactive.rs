//! The proactive engine (spec §4.8(e)): reads `proactive.yaml` on every
//! cycle and self-schedules tasks for enabled behaviors whose interval has
//! elapsed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use unclaude_config::ProactiveConfig;
use unclaude_tasks::{Task, TaskQueue};

use crate::error::DaemonResult;

/// Persisted per-behavior `last_run` timestamps (spec §4.8(e):
/// `<state_dir>/proactive_state.json`).
#[derive(Debug, Default, Serialize, Deserialize)]
struct ProactiveState {
    last_run: HashMap<String, DateTime<Utc>>,
}

/// Runs one proactive-engine cycle against a loaded config and persisted
/// state, deciding whether to enqueue a behavior's task.
pub struct ProactiveEngine {
    state_path: PathBuf,
    idle_threshold_seconds: i64,
}

impl ProactiveEngine {
    /// Build an engine that persists behavior run history to
    /// `<state_dir>/proactive_state.json`.
    #[must_use]
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            state_path: state_dir.as_ref().join("proactive_state.json"),
            idle_threshold_seconds: 120,
        }
    }

    async fn load_state(&self) -> DaemonResult<ProactiveState> {
        match fs::read(&self.state_path).await {
            Ok(body) => Ok(serde_json::from_slice(&body).unwrap_or_default()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(ProactiveState::default()),
            Err(error) => Err(error.into()),
        }
    }

    async fn save_state(&self, state: &ProactiveState) -> DaemonResult<()> {
        let body = serde_json::to_vec_pretty(state)?;
        fs::write(&self.state_path, body).await?;
        Ok(())
    }

    /// Run one cycle. `busy` means at least one task is currently executing;
    /// `idle_seconds` is how long the daemon has been idle. Submits at most
    /// one behavior's task to `queue` and returns its id, if any.
    pub async fn run_cycle(
        &self,
        config: &ProactiveConfig,
        queue: &TaskQueue,
        project_path: &str,
        busy: bool,
        idle_seconds: i64,
    ) -> DaemonResult<Option<String>> {
        if busy || idle_seconds < self.idle_threshold_seconds {
            return Ok(None);
        }

        let mut state = self.load_state().await?;
        let now = Utc::now();
        let soul_context = config.soul_context_block();

        for behavior in &config.behaviors {
            if !behavior.enabled {
                continue;
            }
            if !behavior.active_hours.contains(now.time()) {
                continue;
            }
            let interval = match behavior.interval_duration() {
                Ok(duration) => duration,
                Err(_) => continue,
            };
            if let Some(last_run) = state.last_run.get(&behavior.name) {
                if now - *last_run < interval {
                    continue;
                }
            }

            let source = format!("proactive:{}", behavior.name);
            let already_queued = queue
                .list_tasks(None, usize::MAX)?
                .into_iter()
                .any(|task| task.source == source && task.status.is_poppable());
            if already_queued {
                continue;
            }

            let description = format!("{soul_context}\n\n{}", behavior.task);
            let task = Task::new(description, behavior.priority, source, project_path);
            let task_id = queue.push(task)?;
            state.last_run.insert(behavior.name.clone(), now);
            self.save_state(&state).await?;
            return Ok(Some(task_id));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unclaude_config::ProactiveConfig;

    const SAMPLE: &str = r#"
identity:
  name: Unclaude
behaviors:
  - name: health-check
    enabled: true
    interval: 1m
    task: Check for failing tests.
"#;

    #[tokio::test]
    async fn submits_one_behavior_when_idle_long_enough() {
        let dir = tempfile::tempdir().unwrap();
        let queue = TaskQueue::open(dir.path()).unwrap();
        let config = ProactiveConfig::parse(SAMPLE, "test").unwrap();
        let engine = ProactiveEngine::new(dir.path());

        let submitted = engine
            .run_cycle(&config, &queue, "/tmp/project", false, 300)
            .await
            .unwrap();
        assert!(submitted.is_some());
        assert_eq!(queue.pending_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn skips_when_busy_or_not_idle_long_enough() {
        let dir = tempfile::tempdir().unwrap();
        let queue = TaskQueue::open(dir.path()).unwrap();
        let config = ProactiveConfig::parse(SAMPLE, "test").unwrap();
        let engine = ProactiveEngine::new(dir.path());

        assert!(engine
            .run_cycle(&config, &queue, "/tmp/project", true, 300)
            .await
            .unwrap()
            .is_none());
        assert!(engine
            .run_cycle(&config, &queue, "/tmp/project", false, 5)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn does_not_duplicate_an_already_queued_behavior() {
        let dir = tempfile::tempdir().unwrap();
        let queue = TaskQueue::open(dir.path()).unwrap();
        let config = ProactiveConfig::parse(SAMPLE, "test").unwrap();
        let engine = ProactiveEngine::new(dir.path());

        engine
            .run_cycle(&config, &queue, "/tmp/project", false, 300)
            .await
            .unwrap();
        // Second cycle: behavior already queued (task still Queued), and
        // last_run was just recorded, so neither path should re-enqueue.
        let second = engine
            .run_cycle(&config, &queue, "/tmp/project", false, 300)
            .await
            .unwrap();
        assert!(second.is_none());
        assert_eq!(queue.pending_count().unwrap(), 1);
    }
}
