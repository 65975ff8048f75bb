//! Daemon lifecycle commands (start, stop, status).
//!
//! The CLI never builds a [`unclaude_daemon::DaemonRuntime`] itself — that
//! requires the external `LlmClient`/tool wiring that only the `unclauded`
//! binary supplies. Instead these commands talk to a running (or
//! not-yet-running) daemon through the same on-disk state it reads and
//! writes: the pid file, the status file, and the task queue.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use unclaude_daemon::{pid_file_path, process_is_alive, read_pid_file, read_status_file, DaemonState};

use crate::theme::Theme;

/// Launch `unclauded` as a detached background process.
pub(crate) async fn start(state_dir: &Path, project_path: &str, foreground: bool) -> Result<()> {
    let daemon_dir = state_dir.join("daemon");
    std::fs::create_dir_all(&daemon_dir)?;

    if let Some(pid) = read_pid_file(&pid_file_path(&daemon_dir)).await? {
        if process_is_alive(pid) {
            println!("{}", Theme::warning(&format!("Daemon already running (pid {pid})")));
            return Ok(());
        }
    }

    let mut command = std::process::Command::new("unclauded");
    command
        .arg("--state-dir")
        .arg(state_dir)
        .arg("--project")
        .arg(project_path);

    if foreground {
        println!("{}", Theme::info("Starting daemon in the foreground. Press Ctrl+C to stop."));
        let status = command.status().context("failed to launch unclauded")?;
        if !status.success() {
            anyhow::bail!("unclauded exited with {status}");
        }
        return Ok(());
    }

    let child = command.spawn().context("failed to launch unclauded")?;
    println!("{}", Theme::success(&format!("Daemon started (pid {})", child.id())));
    Ok(())
}

/// Send `SIGTERM` to the running daemon and wait briefly for it to exit.
pub(crate) async fn stop(state_dir: &Path) -> Result<()> {
    let daemon_dir = state_dir.join("daemon");
    let pid_path = pid_file_path(&daemon_dir);

    let Some(pid) = read_pid_file(&pid_path).await? else {
        println!("{}", Theme::warning("Daemon is not running"));
        return Ok(());
    };

    if !process_is_alive(pid) {
        println!("{}", Theme::warning("Daemon is not running (stale pid file)"));
        return Ok(());
    }

    #[allow(clippy::cast_possible_wrap)]
    let raw_pid = pid as i32;
    nix::sys::signal::kill(nix::unistd::Pid::from_raw(raw_pid), nix::sys::signal::Signal::SIGTERM)
        .context("failed to signal daemon process")?;

    for _ in 0..20 {
        tokio::time::sleep(std::time::Duration::from_millis(250)).await;
        if !process_is_alive(pid) {
            println!("{}", Theme::success("Daemon stopped"));
            return Ok(());
        }
    }

    println!("{}", Theme::warning("Daemon did not exit within 5s; it may still be shutting down"));
    Ok(())
}

/// Print the daemon's current status, read from the persisted status file.
pub(crate) async fn status(state_dir: &Path) -> Result<()> {
    let daemon_dir = state_dir.join("daemon");
    let pid_path = pid_file_path(&daemon_dir);

    let Some(pid) = read_pid_file(&pid_path).await? else {
        println!("{}", Theme::warning("Daemon is not running"));
        return Ok(());
    };

    if !process_is_alive(pid) {
        println!("{}", Theme::warning("Daemon is not running (stale pid file)"));
        return Ok(());
    }

    let status_path = daemon_dir.join("status.json");
    let snapshot = read_status_file(&status_path).await.context("failed to read status file")?;

    println!("\n{}", Theme::header("Daemon Status"));
    let state_label = match snapshot.status {
        DaemonState::Idle => "idle".green(),
        DaemonState::Processing => "processing".yellow(),
        DaemonState::Running => "running".green(),
        DaemonState::Starting => "starting".yellow(),
        DaemonState::Stopping => "stopping".yellow(),
        DaemonState::Stopped => "stopped".red(),
        DaemonState::Error => "error".red(),
    };
    println!("  State:      {state_label}");
    println!("  PID:        {}", snapshot.pid.to_string().yellow());
    println!("  Project:    {}", snapshot.project_path.display());
    println!("  Started:    {}", Theme::timestamp(&snapshot.started_at));
    println!("  Completed:  {}", snapshot.tasks_completed.to_string().green());
    println!("  Failed:     {}", snapshot.tasks_failed.to_string().red());
    println!("  Cost (USD): {:.4}", snapshot.total_cost_usd);
    println!("  Queue:      {} pending, {} active", snapshot.queue_pending, snapshot.active_tasks);
    println!();
    Ok(())
}
