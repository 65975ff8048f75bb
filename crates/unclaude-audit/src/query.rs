//! Audit query parameters (spec §4.4 `query`) and the derived session
//! summary (spec §4.4 `get_session_summary`).

use std::collections::HashMap;

use unclaude_core::RiskLevel;

use crate::event::AuditEventType;

/// Filters for [`crate::AuditLog::query`]. Matching events are returned
/// newest-first.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    /// Restrict to one session.
    pub session_id: Option<String>,
    /// Restrict to one event kind.
    pub event_type: Option<AuditEventType>,
    /// Restrict to one risk level.
    pub risk_level: Option<RiskLevel>,
    /// Restrict to events at or after this epoch-seconds timestamp.
    pub since: Option<f64>,
    /// Maximum rows returned. Defaults to 100 when unset via [`AuditQuery::default`]/[`AuditQuery::new`].
    pub limit: u32,
}

impl AuditQuery {
    /// A query with no filters and the default limit of 100.
    #[must_use]
    pub fn new() -> Self {
        Self {
            session_id: None,
            event_type: None,
            risk_level: None,
            since: None,
            limit: 100,
        }
    }

    /// Restrict to `session_id`.
    #[must_use]
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Restrict to `event_type`.
    #[must_use]
    pub fn with_event_type(mut self, event_type: AuditEventType) -> Self {
        self.event_type = Some(event_type);
        self
    }

    /// Restrict to `risk_level`.
    #[must_use]
    pub fn with_risk_level(mut self, risk_level: RiskLevel) -> Self {
        self.risk_level = Some(risk_level);
        self
    }

    /// Restrict to events since `since` (epoch seconds).
    #[must_use]
    pub fn with_since(mut self, since: f64) -> Self {
        self.since = Some(since);
        self
    }

    /// Override the default row limit.
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}

/// Derived statistics for one session (spec §4.4).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SessionSummary {
    /// Total events recorded for the session.
    pub total_events: u64,
    /// Count of events, keyed by the dotted event-type name.
    pub events_by_type: HashMap<String, u64>,
    /// Count of events at `high` or `critical` risk.
    pub high_risk_count: u64,
    /// Count of `permission.denied` events.
    pub denied_count: u64,
    /// Distinct file paths touched by `file.write` events.
    pub distinct_files_modified: Vec<String>,
    /// Distinct commands run via `exec.command` events.
    pub distinct_commands_executed: Vec<String>,
}
