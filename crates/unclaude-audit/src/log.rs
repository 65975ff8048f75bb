//! The buffered, idempotent audit log (spec §4.4).

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;
use unclaude_core::{RiskLevel, Timestamp};
use unclaude_storage::Database;
use uuid::Uuid;

use crate::error::AuditResult;
use crate::event::{AuditEvent, AuditEventType};
use crate::query::{AuditQuery, SessionSummary};

/// Number of buffered entries that triggers an automatic flush.
const BUFFER_FLUSH_THRESHOLD: usize = 50;

const SCHEMA_DDL: &str = "
    DEFINE TABLE audit_events SCHEMAFULL;
    DEFINE FIELD event_id ON audit_events TYPE string;
    DEFINE FIELD event_type ON audit_events TYPE string;
    DEFINE FIELD timestamp ON audit_events TYPE number;
    DEFINE FIELD session_id ON audit_events TYPE option<string>;
    DEFINE FIELD agent_id ON audit_events TYPE option<string>;
    DEFINE FIELD tool_name ON audit_events TYPE option<string>;
    DEFINE FIELD capability ON audit_events TYPE option<string>;
    DEFINE FIELD data ON audit_events FLEXIBLE TYPE option<object>;
    DEFINE FIELD success ON audit_events TYPE bool;
    DEFINE FIELD error_message ON audit_events TYPE option<string>;
    DEFINE FIELD risk_level ON audit_events TYPE string;
    DEFINE INDEX audit_events_event_id ON audit_events FIELDS event_id UNIQUE;
    DEFINE INDEX audit_events_session_id ON audit_events FIELDS session_id;
    DEFINE INDEX audit_events_event_type ON audit_events FIELDS event_type;
    DEFINE INDEX audit_events_timestamp ON audit_events FIELDS timestamp;
    DEFINE INDEX audit_events_risk_level ON audit_events FIELDS risk_level;
";

/// Row shape actually persisted, matching the literal schema of spec §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEvent {
    event_id: String,
    event_type: String,
    timestamp: f64,
    session_id: Option<String>,
    agent_id: Option<String>,
    tool_name: Option<String>,
    capability: Option<String>,
    data: serde_json::Value,
    success: bool,
    error_message: Option<String>,
    risk_level: String,
}

impl From<&AuditEvent> for StoredEvent {
    fn from(event: &AuditEvent) -> Self {
        Self {
            event_id: event.event_id.to_string(),
            event_type: event.event_type.as_str().to_string(),
            timestamp: event.timestamp.as_epoch_seconds(),
            session_id: event.session_id.clone(),
            agent_id: event.agent_id.clone(),
            tool_name: event.tool_name.clone(),
            capability: event.capability.clone(),
            data: event.data.clone(),
            success: event.success,
            error_message: event.error_message.clone(),
            risk_level: event.risk_level.to_string(),
        }
    }
}

impl StoredEvent {
    fn into_audit_event(self) -> Option<AuditEvent> {
        let event_id = Uuid::parse_str(&self.event_id).ok()?;
        let event_type = self.event_type.parse::<AuditEventType>().ok()?;
        let risk_level = match self.risk_level.as_str() {
            "low" => RiskLevel::Low,
            "medium" => RiskLevel::Medium,
            "high" => RiskLevel::High,
            "critical" => RiskLevel::Critical,
            _ => return None,
        };
        let secs = self.timestamp.trunc() as i64;
        let nanos = ((self.timestamp.fract()) * 1_000_000_000.0) as u32;
        let timestamp = Timestamp::from_datetime(chrono::DateTime::from_timestamp(secs, nanos)?);
        Some(AuditEvent {
            event_id,
            event_type,
            timestamp,
            session_id: self.session_id,
            agent_id: self.agent_id,
            tool_name: self.tool_name,
            capability: self.capability,
            data: self.data,
            success: self.success,
            error_message: self.error_message,
            risk_level,
        })
    }
}

/// Buffered, idempotent audit log backed by the embedded relational store.
pub struct AuditLog {
    db: Database,
    buffer: Mutex<Vec<AuditEvent>>,
}

impl AuditLog {
    /// Open (or create) the audit database at `path` and ensure the schema
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened or the schema fails
    /// to apply.
    pub async fn open(path: impl AsRef<Path>) -> AuditResult<Self> {
        let db = Database::open(path).await?;
        db.define_schema(SCHEMA_DDL).await?;
        Ok(Self {
            db,
            buffer: Mutex::new(Vec::new()),
        })
    }

    /// Open an in-memory audit log, used by tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened or the schema fails
    /// to apply.
    pub async fn open_memory() -> AuditResult<Self> {
        let db = Database::open_memory().await?;
        db.define_schema(SCHEMA_DDL).await?;
        Ok(Self {
            db,
            buffer: Mutex::new(Vec::new()),
        })
    }

    /// Buffer `event`, flushing automatically once the buffer reaches
    /// [`BUFFER_FLUSH_THRESHOLD`] entries.
    ///
    /// # Errors
    ///
    /// Returns an error if an automatic flush fails.
    pub async fn log(&self, event: AuditEvent) -> AuditResult<()> {
        let should_flush = {
            let mut buffer = self.buffer.lock().await;
            buffer.push(event);
            buffer.len() >= BUFFER_FLUSH_THRESHOLD
        };
        if should_flush {
            self.flush().await?;
        }
        Ok(())
    }

    /// Write `event` immediately, bypassing the buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn log_now(&self, event: AuditEvent) -> AuditResult<()> {
        self.write_one(&event).await
    }

    /// Persist every buffered entry.
    ///
    /// # Errors
    ///
    /// Returns an error if any write fails; already-written entries from
    /// the same flush remain persisted (each write is independently
    /// idempotent).
    pub async fn flush(&self) -> AuditResult<()> {
        let pending = {
            let mut buffer = self.buffer.lock().await;
            std::mem::take(&mut *buffer)
        };
        if pending.is_empty() {
            return Ok(());
        }
        debug!(count = pending.len(), "flushing audit buffer");
        for event in &pending {
            self.write_one(event).await?;
        }
        Ok(())
    }

    async fn write_one(&self, event: &AuditEvent) -> AuditResult<()> {
        let row = StoredEvent::from(event);
        self.db
            .execute(
                "INSERT IGNORE INTO audit_events { \
                    event_id: $event_id, event_type: $event_type, timestamp: $timestamp, \
                    session_id: $session_id, agent_id: $agent_id, tool_name: $tool_name, \
                    capability: $capability, data: $data, success: $success, \
                    error_message: $error_message, risk_level: $risk_level \
                }",
                vec![
                    ("event_id", serde_json::json!(row.event_id)),
                    ("event_type", serde_json::json!(row.event_type)),
                    ("timestamp", serde_json::json!(row.timestamp)),
                    ("session_id", serde_json::json!(row.session_id)),
                    ("agent_id", serde_json::json!(row.agent_id)),
                    ("tool_name", serde_json::json!(row.tool_name)),
                    ("capability", serde_json::json!(row.capability)),
                    ("data", row.data),
                    ("success", serde_json::json!(row.success)),
                    ("error_message", serde_json::json!(row.error_message)),
                    ("risk_level", serde_json::json!(row.risk_level)),
                ],
            )
            .await?;
        Ok(())
    }

    /// Query matching events, newest-first. Flushes the buffer first so the
    /// result reflects every event logged so far.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush or the query fails.
    pub async fn query(&self, filter: AuditQuery) -> AuditResult<Vec<AuditEvent>> {
        self.flush().await?;

        let mut clauses = Vec::new();
        let mut bindings = Vec::new();

        if let Some(session_id) = &filter.session_id {
            clauses.push("session_id = $session_id");
            bindings.push(("session_id", serde_json::json!(session_id)));
        }
        if let Some(event_type) = filter.event_type {
            clauses.push("event_type = $event_type");
            bindings.push(("event_type", serde_json::json!(event_type.as_str())));
        }
        if let Some(risk_level) = filter.risk_level {
            clauses.push("risk_level = $risk_level");
            bindings.push(("risk_level", serde_json::json!(risk_level.to_string())));
        }
        if let Some(since) = filter.since {
            clauses.push("timestamp >= $since");
            bindings.push(("since", serde_json::json!(since)));
        }
        bindings.push(("limit", serde_json::json!(filter.limit)));

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT * FROM audit_events {where_clause} ORDER BY timestamp DESC LIMIT $limit"
        );

        let rows: Vec<StoredEvent> = self.db.query(&sql, bindings).await?;
        Ok(rows.into_iter().filter_map(StoredEvent::into_audit_event).collect())
    }

    /// Derived statistics for `session_id` (spec §4.4).
    ///
    /// # Errors
    ///
    /// Returns an error if the flush or the underlying query fails.
    pub async fn get_session_summary(&self, session_id: &str) -> AuditResult<SessionSummary> {
        let events = self
            .query(AuditQuery::new().with_session(session_id).with_limit(u32::MAX))
            .await?;

        let mut summary = SessionSummary {
            total_events: events.len() as u64,
            ..SessionSummary::default()
        };

        let mut files = std::collections::BTreeSet::new();
        let mut commands = std::collections::BTreeSet::new();

        for event in &events {
            *summary
                .events_by_type
                .entry(event.event_type.as_str().to_string())
                .or_insert(0) += 1;

            if matches!(event.risk_level, RiskLevel::High | RiskLevel::Critical) {
                summary.high_risk_count += 1;
            }
            if event.event_type == AuditEventType::PermissionDenied {
                summary.denied_count += 1;
            }
            if event.event_type == AuditEventType::FileWrite {
                if let Some(path) = event.data.get("path").and_then(serde_json::Value::as_str) {
                    files.insert(path.to_string());
                }
            }
            if event.event_type == AuditEventType::ExecCommand {
                if let Some(cmd) = event.data.get("command").and_then(serde_json::Value::as_str) {
                    commands.insert(cmd.to_string());
                }
            }
        }

        summary.distinct_files_modified = files.into_iter().collect();
        summary.distinct_commands_executed = commands.into_iter().collect();
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_now_is_queryable_immediately() {
        let log = AuditLog::open_memory().await.unwrap();
        log.log_now(
            AuditEvent::new(AuditEventType::PermissionDenied)
                .with_session("sess-1")
                .with_capability("file.write")
                .with_risk(RiskLevel::High)
                .with_error("not granted"),
        )
        .await
        .unwrap();

        let results = log
            .query(AuditQuery::new().with_session("sess-1"))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].capability.as_deref(), Some("file.write"));
    }

    #[tokio::test]
    async fn buffered_log_is_invisible_until_flush_or_query() {
        let log = AuditLog::open_memory().await.unwrap();
        log.log(AuditEvent::new(AuditEventType::FileRead).with_session("sess-2"))
            .await
            .unwrap();

        // query() flushes internally, so the buffered event becomes visible.
        let results = log
            .query(AuditQuery::new().with_session("sess-2"))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn repeated_event_id_is_idempotent() {
        let log = AuditLog::open_memory().await.unwrap();
        let event = AuditEvent::new(AuditEventType::SessionStart).with_session("sess-3");

        log.log_now(event.clone()).await.unwrap();
        log.log_now(event).await.unwrap();

        let results = log
            .query(AuditQuery::new().with_session("sess-3"))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn session_summary_counts_denials_and_files() {
        let log = AuditLog::open_memory().await.unwrap();
        log.log_now(
            AuditEvent::new(AuditEventType::FileWrite)
                .with_session("sess-4")
                .with_data(serde_json::json!({"path": "/tmp/a.txt"})),
        )
        .await
        .unwrap();
        log.log_now(
            AuditEvent::new(AuditEventType::PermissionDenied)
                .with_session("sess-4")
                .with_risk(RiskLevel::High),
        )
        .await
        .unwrap();

        let summary = log.get_session_summary("sess-4").await.unwrap();
        assert_eq!(summary.total_events, 2);
        assert_eq!(summary.denied_count, 1);
        assert_eq!(summary.high_risk_count, 1);
        assert_eq!(summary.distinct_files_modified, vec!["/tmp/a.txt".to_string()]);
    }
}
