//! The audit event type and the fixed enumeration of event kinds (spec §3
//! Audit Event: "Event kinds cover session lifecycle, tool lifecycle,
//! authorization decisions, file/exec/net/LLM/memory operations, and cost
//! incurrence").

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use unclaude_core::{RiskLevel, Timestamp};
use uuid::Uuid;

/// The closed enumeration of audit event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// A session was created.
    SessionStart,
    /// A session ended (explicit, TTL, or revocation).
    SessionEnd,
    /// A capability check succeeded.
    PermissionGranted,
    /// A capability or sandbox check denied an action.
    PermissionDenied,
    /// A tool invocation began.
    ToolStart,
    /// A tool invocation completed successfully.
    ToolSuccess,
    /// A tool invocation failed.
    ToolFailure,
    /// A file was read.
    FileRead,
    /// A file was written.
    FileWrite,
    /// A shell command was executed.
    ExecCommand,
    /// An outbound network fetch occurred.
    NetFetch,
    /// A web search was performed.
    NetSearch,
    /// An LLM request was sent.
    LlmRequest,
    /// An LLM response was received.
    LlmResponse,
    /// An LLM call failed after exhausting fallbacks.
    LlmError,
    /// Hierarchical memory was read.
    MemoryRead,
    /// Hierarchical memory was written.
    MemoryWrite,
    /// Cost was incurred against the usage tracker.
    CostIncurred,
    /// A task was created.
    TaskCreated,
    /// A task completed.
    TaskCompleted,
    /// A task failed terminally.
    TaskFailed,
    /// An identity or delegation was revoked.
    IdentityRevoked,
}

impl AuditEventType {
    /// All event kinds, in declaration order.
    #[must_use]
    pub const fn all() -> &'static [AuditEventType] {
        use AuditEventType::*;
        &[
            SessionStart,
            SessionEnd,
            PermissionGranted,
            PermissionDenied,
            ToolStart,
            ToolSuccess,
            ToolFailure,
            FileRead,
            FileWrite,
            ExecCommand,
            NetFetch,
            NetSearch,
            LlmRequest,
            LlmResponse,
            LlmError,
            MemoryRead,
            MemoryWrite,
            CostIncurred,
            TaskCreated,
            TaskCompleted,
            TaskFailed,
            IdentityRevoked,
        ]
    }

    /// The dotted wire name (`permission.denied`, `file.write`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        use AuditEventType::*;
        match self {
            SessionStart => "session.start",
            SessionEnd => "session.end",
            PermissionGranted => "permission.granted",
            PermissionDenied => "permission.denied",
            ToolStart => "tool.start",
            ToolSuccess => "tool.success",
            ToolFailure => "tool.failure",
            FileRead => "file.read",
            FileWrite => "file.write",
            ExecCommand => "exec.command",
            NetFetch => "net.fetch",
            NetSearch => "net.search",
            LlmRequest => "llm.request",
            LlmResponse => "llm.response",
            LlmError => "llm.error",
            MemoryRead => "memory.read",
            MemoryWrite => "memory.write",
            CostIncurred => "cost.incurred",
            TaskCreated => "task.created",
            TaskCompleted => "task.completed",
            TaskFailed => "task.failed",
            IdentityRevoked => "identity.revoked",
        }
    }
}

impl fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned by `AuditEventType::from_str` for an unrecognized kind.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown audit event type: {0}")]
pub struct UnknownEventType(pub String);

impl FromStr for AuditEventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AuditEventType::all()
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownEventType(s.to_string()))
    }
}

/// An immutable audit record (spec §3 Audit Event).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Globally unique event id; the idempotency key for storage (P5).
    pub event_id: Uuid,
    /// The kind of event.
    pub event_type: AuditEventType,
    /// When the event occurred.
    pub timestamp: Timestamp,
    /// The session this event pertains to, if any.
    pub session_id: Option<String>,
    /// The agent identity this event pertains to, if any.
    pub agent_id: Option<String>,
    /// The tool involved, if any.
    pub tool_name: Option<String>,
    /// The capability involved, if any.
    pub capability: Option<String>,
    /// Structured, event-kind-specific payload.
    pub data: serde_json::Value,
    /// Whether the underlying operation succeeded.
    pub success: bool,
    /// Error detail, if `success` is `false`.
    pub error_message: Option<String>,
    /// Risk classification.
    pub risk_level: RiskLevel,
}

impl AuditEvent {
    /// Start building an event of `event_type`, stamped `timestamp = now`,
    /// defaulting to `success = true` and `risk_level = Low`.
    #[must_use]
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type,
            timestamp: Timestamp::now(),
            session_id: None,
            agent_id: None,
            tool_name: None,
            capability: None,
            data: serde_json::Value::Null,
            success: true,
            error_message: None,
            risk_level: RiskLevel::Low,
        }
    }

    /// Attach a session id.
    #[must_use]
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Attach an agent id.
    #[must_use]
    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    /// Attach a tool name.
    #[must_use]
    pub fn with_tool(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = Some(tool_name.into());
        self
    }

    /// Attach a capability name (spec's dotted form, e.g. `file.write`).
    #[must_use]
    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capability = Some(capability.into());
        self
    }

    /// Attach a structured data payload.
    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    /// Mark the event as a failure with the given error message.
    #[must_use]
    pub fn with_error(mut self, error_message: impl Into<String>) -> Self {
        self.success = false;
        self.error_message = Some(error_message.into());
        self
    }

    /// Override the default `Low` risk level.
    #[must_use]
    pub fn with_risk(mut self, risk_level: RiskLevel) -> Self {
        self.risk_level = risk_level;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_display_and_from_str() {
        for kind in AuditEventType::all() {
            let s = kind.to_string();
            assert_eq!(s.parse::<AuditEventType>().unwrap(), *kind);
        }
    }

    #[test]
    fn builder_defaults_to_success_low_risk() {
        let event = AuditEvent::new(AuditEventType::FileRead);
        assert!(event.success);
        assert_eq!(event.risk_level, RiskLevel::Low);
        assert!(event.error_message.is_none());
    }

    #[test]
    fn with_error_marks_failure() {
        let event = AuditEvent::new(AuditEventType::PermissionDenied)
            .with_capability("file.write")
            .with_risk(RiskLevel::High)
            .with_error("not granted");
        assert!(!event.success);
        assert_eq!(event.error_message.as_deref(), Some("not granted"));
        assert_eq!(event.capability.as_deref(), Some("file.write"));
    }
}
