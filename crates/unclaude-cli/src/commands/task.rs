//! Task queue commands (push a new task, list existing ones).

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use unclaude_core::Priority;
use unclaude_tasks::{Task, TaskQueue, TaskStatus};

use crate::theme::Theme;

/// Push a new task onto the queue for the running (or next-started) daemon
/// to pick up.
pub(crate) fn push(state_dir: &Path, description: &str, priority: Priority, project_path: &str) -> Result<()> {
    let queue = TaskQueue::open(state_dir.join("daemon"))?;
    let task = Task::new(description, priority, "cli", project_path);
    let task_id = queue.push(task)?;
    println!("{}", Theme::success(&format!("Task queued: {}", Theme::short_id(&task_id))));
    Ok(())
}

/// List tasks, optionally filtered to one status.
pub(crate) fn list(state_dir: &Path, status: Option<TaskStatus>, limit: usize) -> Result<()> {
    let queue = TaskQueue::open(state_dir.join("daemon"))?;
    let tasks = queue.list_tasks(status, limit)?;

    if tasks.is_empty() {
        println!("{}", Theme::info("No tasks found"));
        return Ok(());
    }

    println!("\n{}", Theme::header("Tasks"));
    println!(
        "{:<12} {:<10} {:<8} {}",
        "ID".dimmed(),
        "STATUS".dimmed(),
        "COST".dimmed(),
        "DESCRIPTION".dimmed()
    );
    println!("{}", Theme::separator());

    for task in tasks {
        let status_label = match task.status {
            TaskStatus::Completed => "completed".green().to_string(),
            TaskStatus::Failed => "failed".red().to_string(),
            TaskStatus::Running => "running".yellow().to_string(),
            TaskStatus::Queued => "queued".cyan().to_string(),
            TaskStatus::Retrying => "retrying".yellow().to_string(),
            TaskStatus::Cancelled => "cancelled".dimmed().to_string(),
        };
        println!(
            "{:<12} {status_label:<10} {:<8.2} {}",
            Theme::short_id(&task.task_id),
            task.cost_usd,
            task.description
        );
    }
    println!();
    Ok(())
}
