//! In-memory session representation and its on-disk key (spec §3
//! Conversation Session).

use unclaude_core::Timestamp;

use crate::message::SessionMessage;

/// `agent:<agent_id>:<session_id>` key identifying one conversation log
/// (spec §3 Conversation Session `session_key`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    /// Owning agent identity.
    pub agent_id: String,
    /// Session identifier.
    pub session_id: String,
}

impl SessionKey {
    /// Build a key from its parts.
    #[must_use]
    pub fn new(agent_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            session_id: session_id.into(),
        }
    }

    /// The wire form, `agent:<agent_id>:<session_id>`.
    #[must_use]
    pub fn as_wire(&self) -> String {
        format!("agent:{}:{}", self.agent_id, self.session_id)
    }

    /// The on-disk file stem, `<agent_id>_<session_id>`.
    #[must_use]
    pub fn file_stem(&self) -> String {
        format!("{}_{}", self.agent_id, self.session_id)
    }

    /// Parse a file stem of the form `<agent_id>_<session_id>` back into a
    /// key. Agent IDs never contain `_`, so the first underscore is the
    /// split point.
    #[must_use]
    pub fn parse_file_stem(stem: &str) -> Option<Self> {
        let (agent_id, session_id) = stem.split_once('_')?;
        Some(Self::new(agent_id, session_id))
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_wire())
    }
}

/// A fully materialized conversation, after applying any compaction records
/// (spec §3 Conversation Session).
#[derive(Debug, Clone)]
pub struct ConversationSession {
    /// The session's key.
    pub key: SessionKey,
    /// Project this conversation is scoped to.
    pub project_path: String,
    /// The most recent compaction summary, if the log has been compacted.
    pub compaction_summary: Option<String>,
    /// Messages in insertion order, after compaction has replaced the
    /// compacted prefix (I8).
    pub messages: Vec<SessionMessage>,
    /// When the log was created.
    pub created_at: Timestamp,
    /// When the log was last appended to (or compacted).
    pub updated_at: Timestamp,
}

/// One entry of [`crate::SessionStore::list_sessions`] (spec §4.6
/// `list_sessions`).
#[derive(Debug, Clone)]
pub struct SessionSummary {
    /// The session's key.
    pub key: SessionKey,
    /// Project this conversation is scoped to.
    pub project_path: String,
    /// Number of data lines (messages, excluding the metadata line).
    pub message_count: usize,
    /// File modification time.
    pub modified_at: std::time::SystemTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_form_matches_spec_key_format() {
        let key = SessionKey::new("agent1", "sess1");
        assert_eq!(key.as_wire(), "agent:agent1:sess1");
    }

    #[test]
    fn file_stem_round_trips_through_parse() {
        let key = SessionKey::new("agent1", "sess1");
        let stem = key.file_stem();
        assert_eq!(SessionKey::parse_file_stem(&stem), Some(key));
    }

    #[test]
    fn parse_file_stem_splits_on_first_underscore_only() {
        let key = SessionKey::parse_file_stem("agent1_sess_with_underscores").unwrap();
        assert_eq!(key.agent_id, "agent1");
        assert_eq!(key.session_id, "sess_with_underscores");
    }

    #[test]
    fn parse_file_stem_rejects_stem_without_separator() {
        assert!(SessionKey::parse_file_stem("nounderscore").is_none());
    }
}
