//! The on-disk task queue (spec §4.7).

use std::path::{Path, PathBuf};

use unclaude_core::{Priority, Timestamp};

use crate::error::{TaskQueueError, TaskQueueResult};
use crate::task::{Task, TaskStatus};

/// JSON-file-backed priority queue rooted at `<state_dir>/task_queue.json`
/// (spec §4.7).
pub struct TaskQueue {
    path: PathBuf,
}

impl TaskQueue {
    /// Open (creating if absent) the queue file under `state_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueError::Io`] if the directory or file cannot be
    /// created.
    pub fn open(state_dir: impl AsRef<Path>) -> TaskQueueResult<Self> {
        std::fs::create_dir_all(&state_dir)?;
        let path = state_dir.as_ref().join("task_queue.json");
        if !path.exists() {
            Self::write_all(&path, &[])?;
        }
        Ok(Self { path })
    }

    fn read_all(&self) -> TaskQueueResult<Vec<Task>> {
        Self::read_all_at(&self.path)
    }

    fn read_all_at(path: &Path) -> TaskQueueResult<Vec<Task>> {
        match std::fs::read_to_string(path) {
            Ok(text) if text.trim().is_empty() => Ok(Vec::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(TaskQueueError::Io(e)),
        }
    }

    fn write_all(path: &Path, tasks: &[Task]) -> TaskQueueResult<()> {
        let tmp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(tasks)?;
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Append a new task, rewriting the file, and return its id (spec §4.7
    /// `push`).
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueError::Io`] if the rewrite fails.
    pub fn push(&self, task: Task) -> TaskQueueResult<String> {
        let mut tasks = self.read_all()?;
        let task_id = task.task_id.clone();
        tasks.push(task);
        Self::write_all(&self.path, &tasks)?;
        Ok(task_id)
    }

    /// Reload from disk and pop the highest-priority queued task, marking
    /// it `running` (spec §4.7 `pop`, P9). Ties within a priority level are
    /// broken FIFO by `created_at`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueError::Io`]/[`TaskQueueError::Corrupt`] if the
    /// file cannot be read back.
    pub fn pop(&self) -> TaskQueueResult<Option<Task>> {
        let mut tasks = self.read_all()?;

        let mut chosen: Option<usize> = None;
        for priority in Priority::pop_order() {
            let candidate = tasks
                .iter()
                .enumerate()
                .filter(|(_, t)| t.priority == *priority && t.status.is_poppable())
                .min_by_key(|(_, t)| t.created_at);
            if let Some((idx, _)) = candidate {
                chosen = Some(idx);
                break;
            }
        }

        let Some(idx) = chosen else {
            return Ok(None);
        };

        tasks[idx].status = TaskStatus::Running;
        tasks[idx].started_at = Some(Timestamp::now());
        let popped = tasks[idx].clone();
        Self::write_all(&self.path, &tasks)?;
        Ok(Some(popped))
    }

    /// Mark a task completed with its result (spec §4.7 `complete`).
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueError::NotFound`] if no such task exists.
    pub fn complete(&self, task_id: &str, result: impl Into<String>) -> TaskQueueResult<()> {
        let mut tasks = self.read_all()?;
        let task = tasks
            .iter_mut()
            .find(|t| t.task_id == task_id)
            .ok_or_else(|| TaskQueueError::NotFound(task_id.to_string()))?;
        task.status = TaskStatus::Completed;
        task.result = Some(result.into());
        task.completed_at = Some(Timestamp::now());
        Self::write_all(&self.path, &tasks)?;
        Ok(())
    }

    /// Mark a task failed; re-enqueues it if its retry budget allows (spec
    /// §4.7 `fail`).
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueError::NotFound`] if no such task exists.
    pub fn fail(&self, task_id: &str, error: impl Into<String>) -> TaskQueueResult<()> {
        let mut tasks = self.read_all()?;
        let task = tasks
            .iter_mut()
            .find(|t| t.task_id == task_id)
            .ok_or_else(|| TaskQueueError::NotFound(task_id.to_string()))?;
        task.error = Some(error.into());
        if task.retry_count < task.max_retries {
            task.retry_count += 1;
            task.status = TaskStatus::Queued;
            task.started_at = None;
        } else {
            task.status = TaskStatus::Failed;
            task.completed_at = Some(Timestamp::now());
        }
        Self::write_all(&self.path, &tasks)?;
        Ok(())
    }

    /// Record the iteration count and cumulative cost a task has consumed
    /// so far, without changing its status. Called by the runtime after
    /// every agent loop attempt, before `complete`/`fail` set the terminal
    /// state.
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueError::NotFound`] if no such task exists.
    pub fn record_usage(&self, task_id: &str, iterations: u32, cost_usd: f64) -> TaskQueueResult<()> {
        let mut tasks = self.read_all()?;
        let task = tasks
            .iter_mut()
            .find(|t| t.task_id == task_id)
            .ok_or_else(|| TaskQueueError::NotFound(task_id.to_string()))?;
        task.iterations = iterations;
        task.cost_usd = cost_usd;
        Self::write_all(&self.path, &tasks)?;
        Ok(())
    }

    /// Mark a task cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueError::NotFound`] if no such task exists.
    pub fn cancel(&self, task_id: &str) -> TaskQueueResult<()> {
        let mut tasks = self.read_all()?;
        let task = tasks
            .iter_mut()
            .find(|t| t.task_id == task_id)
            .ok_or_else(|| TaskQueueError::NotFound(task_id.to_string()))?;
        task.status = TaskStatus::Cancelled;
        task.completed_at = Some(Timestamp::now());
        Self::write_all(&self.path, &tasks)?;
        Ok(())
    }

    /// Fetch a single task by id (spec §4.7 `get`).
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueError::Io`]/[`TaskQueueError::Corrupt`] if the
    /// file cannot be read.
    pub fn get(&self, task_id: &str) -> TaskQueueResult<Option<Task>> {
        Ok(self.read_all()?.into_iter().find(|t| t.task_id == task_id))
    }

    /// List tasks, optionally filtered by status, newest-created-first,
    /// truncated to `limit` (spec §4.7 `list_tasks`, default limit 50).
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueError::Io`]/[`TaskQueueError::Corrupt`] if the
    /// file cannot be read.
    pub fn list_tasks(&self, status: Option<TaskStatus>, limit: usize) -> TaskQueueResult<Vec<Task>> {
        let mut tasks = self.read_all()?;
        if let Some(status) = status {
            tasks.retain(|t| t.status == status);
        }
        tasks.sort_by_key(|t| std::cmp::Reverse(t.created_at));
        tasks.truncate(limit);
        Ok(tasks)
    }

    /// Count tasks still eligible to run (spec §4.7 `pending_count`).
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueError::Io`]/[`TaskQueueError::Corrupt`] if the
    /// file cannot be read.
    pub fn pending_count(&self) -> TaskQueueResult<usize> {
        Ok(self.read_all()?.iter().filter(|t| t.status.is_poppable()).count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue() -> (tempfile::TempDir, TaskQueue) {
        let dir = tempfile::tempdir().unwrap();
        let queue = TaskQueue::open(dir.path()).unwrap();
        (dir, queue)
    }

    #[test]
    fn push_then_get_round_trips() {
        let (_dir, queue) = queue();
        let id = queue.push(Task::new("desc", Priority::Normal, "cli", "/p")).unwrap();
        let fetched = queue.get(&id).unwrap().unwrap();
        assert_eq!(fetched.description, "desc");
    }

    #[test]
    fn pop_orders_by_priority_then_fifo() {
        let (_dir, queue) = queue();
        queue.push(Task::new("A", Priority::Normal, "cli", "/p")).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        queue.push(Task::new("B", Priority::Critical, "cli", "/p")).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        queue.push(Task::new("C", Priority::High, "cli", "/p")).unwrap();

        let order: Vec<String> = (0..3)
            .map(|_| queue.pop().unwrap().unwrap().description)
            .collect();
        assert_eq!(order, vec!["B", "C", "A"]);
        assert!(queue.pop().unwrap().is_none());
    }

    #[test]
    fn pop_marks_task_running_and_stamps_started_at() {
        let (_dir, queue) = queue();
        queue.push(Task::new("A", Priority::Normal, "cli", "/p")).unwrap();
        let popped = queue.pop().unwrap().unwrap();
        assert_eq!(popped.status, TaskStatus::Running);
        assert!(popped.started_at.is_some());
    }

    #[test]
    fn pop_reloads_from_disk_for_cross_process_visibility() {
        let (dir, queue) = queue();
        // Simulate a second process pushing directly to the same file.
        let other = TaskQueue::open(dir.path()).unwrap();
        other.push(Task::new("from other process", Priority::High, "cli", "/p")).unwrap();

        let popped = queue.pop().unwrap().unwrap();
        assert_eq!(popped.description, "from other process");
    }

    #[test]
    fn complete_sets_result_and_terminal_status() {
        let (_dir, queue) = queue();
        let id = queue.push(Task::new("A", Priority::Normal, "cli", "/p")).unwrap();
        queue.pop().unwrap();
        queue.complete(&id, "done").unwrap();

        let task = queue.get(&id).unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.result.as_deref(), Some("done"));
        assert!(task.completed_at.is_some());
    }

    #[test]
    fn fail_re_enqueues_until_retry_budget_is_exhausted() {
        let (_dir, queue) = queue();
        let mut task = Task::new("A", Priority::Normal, "cli", "/p");
        task.max_retries = 2;
        let id = queue.push(task).unwrap();

        queue.pop().unwrap();
        queue.fail(&id, "boom").unwrap();
        let after_first = queue.get(&id).unwrap().unwrap();
        assert_eq!(after_first.status, TaskStatus::Queued);
        assert_eq!(after_first.retry_count, 1);

        queue.pop().unwrap();
        queue.fail(&id, "boom again").unwrap();
        let after_second = queue.get(&id).unwrap().unwrap();
        assert_eq!(after_second.status, TaskStatus::Queued);
        assert_eq!(after_second.retry_count, 2);

        queue.pop().unwrap();
        queue.fail(&id, "boom final").unwrap();
        let after_third = queue.get(&id).unwrap().unwrap();
        assert_eq!(after_third.status, TaskStatus::Failed);
        assert_eq!(after_third.retry_count, 2);
        assert!(after_third.completed_at.is_some());
    }

    #[test]
    fn list_tasks_filters_by_status_and_respects_limit() {
        let (_dir, queue) = queue();
        for i in 0..5 {
            queue.push(Task::new(format!("task-{i}"), Priority::Normal, "cli", "/p")).unwrap();
        }
        let id = queue.push(Task::new("running-one", Priority::Normal, "cli", "/p")).unwrap();
        queue.pop().unwrap();
        let _ = &id;

        let queued = queue.list_tasks(Some(TaskStatus::Queued), 50).unwrap();
        assert_eq!(queued.len(), 5);

        let limited = queue.list_tasks(None, 2).unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn pending_count_reflects_poppable_tasks() {
        let (_dir, queue) = queue();
        queue.push(Task::new("A", Priority::Normal, "cli", "/p")).unwrap();
        queue.push(Task::new("B", Priority::Normal, "cli", "/p")).unwrap();
        assert_eq!(queue.pending_count().unwrap(), 2);

        queue.pop().unwrap();
        assert_eq!(queue.pending_count().unwrap(), 1);
    }

    #[test]
    fn cancel_marks_task_cancelled() {
        let (_dir, queue) = queue();
        let id = queue.push(Task::new("A", Priority::Normal, "cli", "/p")).unwrap();
        queue.cancel(&id).unwrap();
        let task = queue.get(&id).unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Cancelled);
    }

    #[test]
    fn unknown_task_id_is_not_found() {
        let (_dir, queue) = queue();
        let err = queue.complete("ghost", "x").unwrap_err();
        assert!(matches!(err, TaskQueueError::NotFound(_)));
    }
}
