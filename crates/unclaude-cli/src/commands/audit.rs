//! Audit command — list and inspect audit log entries.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use unclaude_audit::{AuditLog, AuditQuery};

use crate::theme::Theme;

/// List the most recent audit events, optionally restricted to one session.
pub(crate) async fn list(audit_db_path: &Path, session_id: Option<&str>, limit: u32) -> Result<()> {
    let log = AuditLog::open(audit_db_path).await?;

    let mut query = AuditQuery::new().with_limit(limit);
    if let Some(session_id) = session_id {
        query = query.with_session(session_id);
    }
    let events = log.query(query).await?;

    if events.is_empty() {
        println!("{}", Theme::info("No audit entries"));
        return Ok(());
    }

    println!("\n{}", Theme::header("Audit Events"));
    println!(
        "{:<20} {:<20} {:<16} {}",
        "TIMESTAMP".dimmed(),
        "SESSION".dimmed(),
        "EVENT".dimmed(),
        "RESULT".dimmed()
    );
    println!("{}", Theme::separator());

    for event in events {
        let result = if event.success {
            "OK".green().to_string()
        } else {
            "FAIL".red().to_string()
        };
        println!(
            "{:<20} {:<20} {:<16} {result}",
            Theme::timestamp(&event.timestamp.0),
            event.session_id.as_deref().unwrap_or("-"),
            event.event_type.as_str(),
        );
    }
    println!();
    Ok(())
}

/// Print the derived statistics for one session (spec §4.4).
pub(crate) async fn stats(audit_db_path: &Path, session_id: &str) -> Result<()> {
    let log = AuditLog::open(audit_db_path).await?;
    let summary = log.get_session_summary(session_id).await?;

    println!("\n{}", Theme::header("Session Audit Summary"));
    println!("  Session:       {session_id}");
    println!("  Total events:  {}", summary.total_events);
    println!("  High risk:     {}", summary.high_risk_count);
    println!("  Denials:       {}", summary.denied_count);
    println!("  Files touched: {}", summary.distinct_files_modified.len());
    println!("  Commands run:  {}", summary.distinct_commands_executed.len());
    println!();
    Ok(())
}
