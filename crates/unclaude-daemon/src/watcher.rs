//! The two file watchers (spec §4.8(f)): a daemon-level poll, not an
//! inotify-style event stream — each watcher scans its target on an
//! interval of `2 * poll_interval` and diffs against persisted state in
//! `<state_dir>/processed_tasks.json`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::fs;
use unclaude_core::Priority;
use unclaude_tasks::{Task, TaskQueue};

use crate::error::DaemonResult;

/// Persisted dedup keys shared by both watchers (spec §4.8(f): "Processed
/// keys persist in `<state_dir>/processed_tasks.json`").
#[derive(Debug, Default, Serialize, Deserialize)]
struct ProcessedTasks {
    keys: HashSet<String>,
}

async fn load_processed(path: &Path) -> DaemonResult<ProcessedTasks> {
    match fs::read(path).await {
        Ok(body) => Ok(serde_json::from_slice(&body).unwrap_or_default()),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(ProcessedTasks::default()),
        Err(error) => Err(error.into()),
    }
}

async fn save_processed(path: &Path, state: &ProcessedTasks) -> DaemonResult<()> {
    let body = serde_json::to_vec_pretty(state)?;
    fs::write(path, body).await?;
    Ok(())
}

/// Watches `<project>/.unclaude/tasks/*.md`: each file whose `(name, mtime)`
/// hasn't been seen becomes a new normal-priority task, its content the
/// description (spec §4.8(f)).
pub struct TaskFileWatcher {
    processed_path: PathBuf,
}

impl TaskFileWatcher {
    /// Build a watcher persisting dedup state under `state_dir`.
    #[must_use]
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            processed_path: state_dir.as_ref().join("processed_tasks.json"),
        }
    }

    /// Scan `<project_path>/.unclaude/tasks/*.md` once, enqueuing any
    /// unseen files. Returns the number of tasks enqueued.
    pub async fn scan(&self, project_path: &str, queue: &TaskQueue) -> DaemonResult<usize> {
        let tasks_dir = Path::new(project_path).join(".unclaude").join("tasks");
        let mut entries = match fs::read_dir(&tasks_dir).await {
            Ok(entries) => entries,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(error) => return Err(error.into()),
        };

        let mut processed = load_processed(&self.processed_path).await?;
        let mut enqueued = 0usize;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            let mtime_secs = metadata
                .modified()
                .ok()
                .and_then(|m| m.duration_since(std::time::UNIX_EPOCH).ok())
                .map_or(0, |d| d.as_secs());
            let name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
            let key = format!("taskfile:{name}:{mtime_secs}");

            if processed.keys.contains(&key) {
                continue;
            }
            let Ok(content) = fs::read_to_string(&path).await else {
                continue;
            };

            let task = Task::new(content, Priority::Normal, "watcher:tasks_dir", project_path);
            queue.push(task)?;
            processed.keys.insert(key);
            enqueued += 1;
        }

        if enqueued > 0 {
            save_processed(&self.processed_path, &processed).await?;
        }
        Ok(enqueued)
    }
}

/// Watches `<project>/TASKS.md`: each line matching `[-*]\s*\[\s*\]\s+(.+)`
/// becomes a normal-priority task once, keyed on the task text itself (spec
/// §4.8(f)).
pub struct TasksMarkdownWatcher {
    processed_path: PathBuf,
    pattern: Regex,
}

impl TasksMarkdownWatcher {
    /// Build a watcher persisting dedup state under `state_dir`.
    #[must_use]
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            processed_path: state_dir.as_ref().join("processed_tasks.json"),
            pattern: Regex::new(r"^[-*]\s*\[\s*\]\s+(.+)$").expect("static regex is valid"),
        }
    }

    /// Scan `<project_path>/TASKS.md` once, enqueuing any unseen unchecked
    /// items. Returns the number of tasks enqueued.
    pub async fn scan(&self, project_path: &str, queue: &TaskQueue) -> DaemonResult<usize> {
        let path = Path::new(project_path).join("TASKS.md");
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(error) => return Err(error.into()),
        };

        let mut processed = load_processed(&self.processed_path).await?;
        let mut enqueued = 0usize;

        for line in content.lines() {
            let Some(captures) = self.pattern.captures(line.trim_start()) else {
                continue;
            };
            let text = captures[1].trim().to_string();
            if text.is_empty() {
                continue;
            }
            let key = format!("tasksmd:{text}");
            if processed.keys.contains(&key) {
                continue;
            }

            let task = Task::new(text, Priority::Normal, "watcher:tasks_md", project_path);
            queue.push(task)?;
            processed.keys.insert(key);
            enqueued += 1;
        }

        if enqueued > 0 {
            save_processed(&self.processed_path, &processed).await?;
        }
        Ok(enqueued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn task_file_watcher_enqueues_each_unseen_md_file_once() {
        let state_dir = tempfile::tempdir().unwrap();
        let project_dir = tempfile::tempdir().unwrap();
        let tasks_dir = project_dir.path().join(".unclaude").join("tasks");
        tokio::fs::create_dir_all(&tasks_dir).await.unwrap();
        tokio::fs::write(tasks_dir.join("a.md"), "do thing A").await.unwrap();

        let queue = TaskQueue::open(state_dir.path()).unwrap();
        let watcher = TaskFileWatcher::new(state_dir.path());

        let first = watcher.scan(project_dir.path().to_str().unwrap(), &queue).await.unwrap();
        assert_eq!(first, 1);
        assert_eq!(queue.pending_count().unwrap(), 1);

        let second = watcher.scan(project_dir.path().to_str().unwrap(), &queue).await.unwrap();
        assert_eq!(second, 0);
        assert_eq!(queue.pending_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn missing_tasks_dir_is_not_an_error() {
        let state_dir = tempfile::tempdir().unwrap();
        let project_dir = tempfile::tempdir().unwrap();
        let queue = TaskQueue::open(state_dir.path()).unwrap();
        let watcher = TaskFileWatcher::new(state_dir.path());

        let count = watcher.scan(project_dir.path().to_str().unwrap(), &queue).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn tasks_markdown_watcher_matches_unchecked_items_once() {
        let state_dir = tempfile::tempdir().unwrap();
        let project_dir = tempfile::tempdir().unwrap();
        tokio::fs::write(
            project_dir.path().join("TASKS.md"),
            "- [ ] fix the bug\n- [x] already done\n* [ ] write docs\nnot a task line\n",
        )
        .await
        .unwrap();

        let queue = TaskQueue::open(state_dir.path()).unwrap();
        let watcher = TasksMarkdownWatcher::new(state_dir.path());

        let first = watcher.scan(project_dir.path().to_str().unwrap(), &queue).await.unwrap();
        assert_eq!(first, 2);

        let second = watcher.scan(project_dir.path().to_str().unwrap(), &queue).await.unwrap();
        assert_eq!(second, 0);
        assert_eq!(queue.pending_count().unwrap(), 2);
    }
}
