//! Sessions command — list, inspect, and delete conversation logs.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use unclaude_sessions::{SessionKey, SessionStore};

use crate::theme::Theme;

/// List conversation sessions, most recently modified first.
pub(crate) fn list(sessions_dir: &Path, agent_id: Option<&str>, limit: usize) -> Result<()> {
    let store = SessionStore::open(sessions_dir)?;
    let sessions = store.list_sessions(agent_id, limit)?;

    if sessions.is_empty() {
        println!("{}", Theme::info("No sessions found"));
        return Ok(());
    }

    println!("\n{}", Theme::header("Conversation Sessions"));
    println!(
        "{:<14} {:>8} {}",
        "KEY".dimmed(),
        "MSGS".dimmed(),
        "PROJECT".dimmed()
    );
    println!("{}", Theme::separator());

    for session in sessions {
        println!(
            "{:<14} {:>8} {}",
            Theme::short_id(&session.key.as_wire()),
            session.message_count,
            session.project_path.dimmed()
        );
    }
    println!();
    Ok(())
}

/// Show a session's full message log.
pub(crate) fn show(sessions_dir: &Path, agent_id: &str, session_id: &str) -> Result<()> {
    let store = SessionStore::open(sessions_dir)?;
    let key = SessionKey::new(agent_id, session_id);
    let session = store.load(&key)?;

    println!("\n{}", Theme::header(&format!("Session {}", key.as_wire())));
    println!("  Project: {}", session.project_path);
    println!("  Messages: {}", session.messages.len());
    println!("{}", Theme::separator());
    for message in &session.messages {
        println!("[{}] {}", message.role, message.content.as_deref().unwrap_or("(tool call)"));
    }
    println!();
    Ok(())
}

/// Delete a session's log.
pub(crate) fn delete(sessions_dir: &Path, agent_id: &str, session_id: &str) -> Result<()> {
    let store = SessionStore::open(sessions_dir)?;
    let key = SessionKey::new(agent_id, session_id);
    store.delete(&key)?;
    println!("{}", Theme::success(&format!("Deleted session {}", key.as_wire())));
    Ok(())
}
