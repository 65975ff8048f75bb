//! `unclauded` — standalone daemon binary for the unclaude autonomous agent
//! security core.
//!
//! A thin entry point: loads configuration, builds a
//! [`unclaude_daemon::DaemonRuntime`], and drives it until a shutdown
//! signal arrives. It exists as its own binary (rather than a subcommand of
//! `unclaude`) so process managers and `ps` see a distinct `unclauded`
//! process name, matching the teacher's own daemon/CLI binary split.

#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use colored::Colorize;
use unclaude_core::{ChatMessage, ChatResponse, LlmClient, LlmError};
use unclaude_daemon::{DaemonRuntime, RuntimeConfig};

/// unclaude daemon — background task runner.
#[derive(Parser)]
#[command(name = "unclauded")]
#[command(author, version, about = "unclaude daemon — background task runner")]
struct Args {
    /// State directory (defaults to `$UNCLAUDE_HOME` or `~/.unclaude`).
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Project directory this daemon instance operates against.
    #[arg(long)]
    project: Option<PathBuf>,

    /// Enable verbose (debug) logging.
    #[arg(short, long)]
    verbose: bool,
}

/// Placeholder [`LlmClient`] used until a real provider is wired in. The LLM
/// client is an out-of-scope external collaborator (spec §1): this daemon
/// is runnable and exercises every other pillar, but every `chat` call
/// fails until a concrete provider crate is substituted here.
struct UnconfiguredLlmClient;

#[async_trait]
impl LlmClient for UnconfiguredLlmClient {
    async fn chat(&self, _model: &str, _messages: &[ChatMessage], _tools_enabled: bool) -> Result<ChatResponse, LlmError> {
        Err(LlmError::Request("no LLM provider configured; substitute a real unclaude_core::LlmClient".to_string()))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    let log_config = unclaude_telemetry::LogConfig::new(level).with_format(unclaude_telemetry::LogFormat::Compact);
    if let Err(error) = unclaude_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {error}");
    }

    let state_dir = match args.state_dir {
        Some(dir) => dir,
        None => unclaude_core::dirs::UnclaudeHome::resolve()?.root().to_path_buf(),
    };
    std::fs::create_dir_all(&state_dir)?;
    let home = unclaude_core::dirs::UnclaudeHome::from_path(state_dir.clone());
    home.ensure()?;

    let project_path = match args.project {
        Some(path) => path,
        None => std::env::current_dir()?,
    };

    let config = unclaude_config::Config::load(home.config_path()).unwrap_or_default();
    let proactive_config = unclaude_config::ProactiveConfig::load(home.proactive_config_path()).ok();

    let runtime_config = RuntimeConfig::new(state_dir, project_path.display().to_string(), &config);

    let llm: Arc<dyn LlmClient> = Arc::new(UnconfiguredLlmClient);
    let tools = HashMap::new();

    let runtime = Arc::new(
        DaemonRuntime::new(runtime_config, llm, tools, None, None, None, proactive_config).await?,
    );

    println!("{}", "unclauded starting".cyan().bold());

    let handle = DaemonRuntime::handle(&runtime);
    let runner = tokio::spawn(async move { runtime.run().await });

    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = sigterm.recv() => {},
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.ok();
    }

    println!("\n{}", "Shutting down daemon...".yellow());
    handle.shutdown();
    runner.await??;

    println!("{}", "unclauded stopped".green());
    Ok(())
}
