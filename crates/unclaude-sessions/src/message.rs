//! The session message line format (spec §3 Session Message).

use serde::{Deserialize, Serialize};
use unclaude_core::{ChatMessage, ToolCallRequest, Timestamp};

/// A single logged conversation turn.
///
/// Deliberately mirrors [`unclaude_core::ChatMessage`]'s role/content/
/// tool_calls/tool_call_id/name shape, adding the on-disk `timestamp` and
/// `metadata` fields the spec's wire format requires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMessage {
    /// `system`, `user`, `assistant`, or `tool`.
    pub role: String,
    /// Text content; `None` for an assistant message that is pure tool calls.
    #[serde(default)]
    pub content: Option<String>,
    /// Tool calls emitted by the assistant, if any.
    #[serde(default)]
    pub tool_calls: Vec<ToolCallRequest>,
    /// The tool call this message answers, if `role == "tool"`.
    #[serde(default)]
    pub tool_call_id: Option<String>,
    /// Tool name, set when `role == "tool"`.
    #[serde(default)]
    pub name: Option<String>,
    /// When the message was appended.
    pub timestamp: Timestamp,
    /// Free-form caller metadata.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl SessionMessage {
    /// Build a message stamped with the current time, no metadata.
    #[must_use]
    pub fn new(role: impl Into<String>, content: Option<String>) -> Self {
        Self {
            role: role.into(),
            content,
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
            timestamp: Timestamp::now(),
            metadata: serde_json::Value::Null,
        }
    }

    /// An assistant message carrying tool calls.
    #[must_use]
    pub fn assistant_tool_calls(tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: None,
            tool_calls,
            tool_call_id: None,
            name: None,
            timestamp: Timestamp::now(),
            metadata: serde_json::Value::Null,
        }
    }

    /// A tool-role response to `tool_call_id`.
    #[must_use]
    pub fn tool_response(tool_call_id: impl Into<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
            name: Some(name.into()),
            timestamp: Timestamp::now(),
            metadata: serde_json::Value::Null,
        }
    }

    /// Whether this message is an assistant message that opens a tool-call
    /// unit (spec §4.6 causality rule).
    #[must_use]
    pub fn opens_tool_unit(&self) -> bool {
        self.role == "assistant" && !self.tool_calls.is_empty()
    }

    /// Convert to the shared `ChatMessage` shape consumed by the daemon's
    /// agent loop / LLM client boundary.
    #[must_use]
    pub fn to_chat_message(&self) -> ChatMessage {
        ChatMessage {
            role: self.role.clone(),
            content: self.content.clone(),
            tool_calls: self.tool_calls.clone(),
            tool_call_id: self.tool_call_id.clone(),
            name: self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let msg = SessionMessage::new("user", Some("hello".to_string()));
        let json = serde_json::to_string(&msg).unwrap();
        let back: SessionMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back.role, "user");
        assert_eq!(back.content.as_deref(), Some("hello"));
    }

    #[test]
    fn opens_tool_unit_only_for_assistant_with_calls() {
        let plain = SessionMessage::new("assistant", Some("hi".to_string()));
        assert!(!plain.opens_tool_unit());

        let with_calls = SessionMessage::assistant_tool_calls(vec![ToolCallRequest {
            id: "1".to_string(),
            name: "bash_execute".to_string(),
            arguments: serde_json::json!({}),
        }]);
        assert!(with_calls.opens_tool_unit());
    }
}
