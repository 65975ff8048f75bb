//! `unclaude` — command-line interface for the autonomous agent security
//! and execution core.
//!
//! A thin client: every subcommand reads or writes the same on-disk state
//! directory the `unclauded` daemon owns (pid file, status file, task
//! queue, audit log, session logs, identity store). There is no RPC layer;
//! the daemon and CLI are coupled through the filesystem, the way the
//! queue and session store already define their contracts.

#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod commands;
mod theme;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use unclaude_core::dirs::UnclaudeHome;
use unclaude_core::Priority;
use unclaude_tasks::TaskStatus;

/// unclaude — autonomous agent security and execution core.
#[derive(Parser)]
#[command(name = "unclaude")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose (debug) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Override the state directory (defaults to `$UNCLAUDE_HOME` or `~/.unclaude`).
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    /// Project directory this invocation operates against.
    #[arg(long, global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the background daemon.
    Start {
        /// Run in the foreground instead of detaching.
        #[arg(short, long)]
        foreground: bool,
    },
    /// Stop the background daemon.
    Stop,
    /// Show the daemon's current status.
    Status,
    /// Queue a new task for the daemon to execute.
    Task {
        /// Task description, used as the agent loop's prompt seed.
        description: String,
        /// Scheduling priority.
        #[arg(short, long, default_value = "normal")]
        priority: String,
    },
    /// List queued and recently-finished tasks.
    List {
        /// Restrict to one status (queued, running, completed, failed, cancelled, retrying).
        #[arg(short, long)]
        status: Option<String>,
        /// Maximum rows to show.
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Manage the daemon's cryptographic identity.
    Keys {
        #[command(subcommand)]
        command: KeyCommands,
    },
    /// Inspect the audit log.
    Audit {
        #[command(subcommand)]
        command: AuditCommands,
    },
    /// Inspect conversation session logs.
    Sessions {
        #[command(subcommand)]
        command: SessionCommands,
    },
}

#[derive(Subcommand)]
enum KeyCommands {
    /// Show the root/owner identity and effective delegation chain.
    Show,
}

#[derive(Subcommand)]
enum AuditCommands {
    /// List recent audit events.
    List {
        /// Restrict to one session.
        #[arg(short, long)]
        session: Option<String>,
        /// Maximum rows to show.
        #[arg(short, long, default_value = "50")]
        limit: u32,
    },
    /// Show derived statistics for one session.
    Stats {
        /// Session id.
        session: String,
    },
}

#[derive(Subcommand)]
enum SessionCommands {
    /// List conversation sessions.
    List {
        /// Restrict to one agent id (e.g. `daemon`).
        #[arg(short, long)]
        agent: Option<String>,
        /// Maximum rows to show.
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Show a session's full message log.
    Show {
        /// Agent id half of the session key.
        agent: String,
        /// Session id half of the session key.
        session: String,
    },
    /// Delete a session's log.
    Delete {
        /// Agent id half of the session key.
        agent: String,
        /// Session id half of the session key.
        session: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let log_config = unclaude_telemetry::LogConfig::new(level).with_format(unclaude_telemetry::LogFormat::Compact);
    if let Err(error) = unclaude_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {error}");
    }

    let state_dir = match cli.state_dir {
        Some(dir) => dir,
        None => UnclaudeHome::resolve()?.root().to_path_buf(),
    };
    std::fs::create_dir_all(&state_dir)?;

    let project_path = match cli.project {
        Some(path) => path,
        None => std::env::current_dir()?,
    };
    let project_path = project_path.display().to_string();

    let home = UnclaudeHome::from_path(state_dir.clone());

    match cli.command {
        Commands::Start { foreground } => commands::daemon::start(&state_dir, &project_path, foreground).await?,
        Commands::Stop => commands::daemon::stop(&state_dir).await?,
        Commands::Status => commands::daemon::status(&state_dir).await?,
        Commands::Task { description, priority } => {
            let priority = Priority::parse(&priority).unwrap_or(Priority::Normal);
            commands::task::push(&state_dir, &description, priority, &project_path)?;
        },
        Commands::List { status, limit } => {
            let status = status.as_deref().and_then(parse_task_status);
            commands::task::list(&state_dir, status, limit)?;
        },
        Commands::Keys { command } => match command {
            KeyCommands::Show => commands::keys::show(&home.identity_dir())?,
        },
        Commands::Audit { command } => match command {
            AuditCommands::List { session, limit } => {
                commands::audit::list(&home.audit_db_path(), session.as_deref(), limit).await?;
            },
            AuditCommands::Stats { session } => {
                commands::audit::stats(&home.audit_db_path(), &session).await?;
            },
        },
        Commands::Sessions { command } => match command {
            SessionCommands::List { agent, limit } => {
                commands::sessions::list(&home.sessions_dir(), agent.as_deref(), limit)?;
            },
            SessionCommands::Show { agent, session } => {
                commands::sessions::show(&home.sessions_dir(), &agent, &session)?;
            },
            SessionCommands::Delete { agent, session } => {
                commands::sessions::delete(&home.sessions_dir(), &agent, &session)?;
            },
        },
    }

    Ok(())
}

fn parse_task_status(s: &str) -> Option<TaskStatus> {
    match s {
        "queued" => Some(TaskStatus::Queued),
        "running" => Some(TaskStatus::Running),
        "completed" => Some(TaskStatus::Completed),
        "failed" => Some(TaskStatus::Failed),
        "cancelled" => Some(TaskStatus::Cancelled),
        "retrying" => Some(TaskStatus::Retrying),
        _ => None,
    }
}
