//! File-backed session store (spec §4.6 Public contract).

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use unclaude_core::Timestamp;

use crate::error::{SessionStoreError, SessionStoreResult};
use crate::message::SessionMessage;
use crate::session::{ConversationSession, SessionKey, SessionSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MetaLine {
    kind: String,
    key: String,
    project_path: String,
    created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CompactionLine {
    kind: String,
    summary: String,
    compacted_count: usize,
    timestamp: Timestamp,
}

enum ParsedLine {
    Meta(MetaLine),
    Compaction(CompactionLine),
    Message(SessionMessage),
}

fn parse_line(line: &str) -> Option<ParsedLine> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let value: serde_json::Value = serde_json::from_str(trimmed).ok()?;
    match value.get("kind").and_then(serde_json::Value::as_str) {
        Some("session_meta") => serde_json::from_value(value).ok().map(ParsedLine::Meta),
        Some("compaction") => serde_json::from_value(value).ok().map(ParsedLine::Compaction),
        _ => serde_json::from_value(value).ok().map(ParsedLine::Message),
    }
}

/// Groups of messages where an assistant `tool_calls` message and its
/// subsequent `tool`-role responses are treated as one indivisible unit
/// (spec §4.6 causality rule).
fn group_into_units(messages: &[SessionMessage]) -> Vec<Vec<usize>> {
    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut in_unit = false;
    for (idx, msg) in messages.iter().enumerate() {
        if in_unit && msg.role == "tool" {
            groups.last_mut().expect("unit open implies a group exists").push(idx);
            continue;
        }
        in_unit = false;
        groups.push(vec![idx]);
        if msg.opens_tool_unit() {
            in_unit = true;
        }
    }
    groups
}

/// Select the suffix of `messages` that keeps at least `keep_recent`
/// messages without splitting a tool-call unit, returning the selected
/// messages and how many were dropped from the front.
fn select_kept_suffix(messages: &[SessionMessage], keep_recent: usize) -> (Vec<SessionMessage>, usize) {
    if messages.len() <= keep_recent {
        return (messages.to_vec(), 0);
    }
    let groups = group_into_units(messages);
    let mut kept_indices: Vec<usize> = Vec::new();
    for group in groups.iter().rev() {
        if kept_indices.len() >= keep_recent {
            break;
        }
        let mut group_indices = group.clone();
        kept_indices.append(&mut group_indices);
    }
    kept_indices.sort_unstable();
    let kept: Vec<SessionMessage> = kept_indices.iter().map(|&i| messages[i].clone()).collect();
    let dropped = messages.len() - kept.len();
    (kept, dropped)
}

/// File-backed session store rooted at `<sessions_dir>` (spec §4.6).
pub struct SessionStore {
    sessions_dir: PathBuf,
}

impl SessionStore {
    /// Open (creating if needed) the session store at `sessions_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError::Io`] if the directory cannot be created.
    pub fn open(sessions_dir: impl Into<PathBuf>) -> SessionStoreResult<Self> {
        let sessions_dir = sessions_dir.into();
        std::fs::create_dir_all(&sessions_dir)?;
        Ok(Self { sessions_dir })
    }

    fn path_for(&self, key: &SessionKey) -> PathBuf {
        self.sessions_dir.join(format!("{}.log", key.file_stem()))
    }

    /// Create a new conversation log, writing its metadata line
    /// immediately (spec §4.6 `create`).
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError::Io`] if the metadata line cannot be
    /// written.
    pub fn create(
        &self,
        agent_id: impl Into<String>,
        session_id: Option<String>,
        project_path: impl Into<String>,
    ) -> SessionStoreResult<ConversationSession> {
        let agent_id = agent_id.into();
        let session_id = session_id.unwrap_or_else(|| unclaude_core::SessionId::new().short());
        let key = SessionKey::new(agent_id, session_id);
        let project_path = project_path.into();
        let created_at = Timestamp::now();

        let meta = MetaLine {
            kind: "session_meta".to_string(),
            key: key.as_wire(),
            project_path: project_path.clone(),
            created_at,
        };
        let mut file = std::fs::File::create(self.path_for(&key))?;
        writeln!(file, "{}", serde_json::to_string(&meta)?)?;
        file.flush()?;

        Ok(ConversationSession {
            key,
            project_path,
            compaction_summary: None,
            messages: Vec::new(),
            created_at,
            updated_at: created_at,
        })
    }

    /// Append one message as a single atomic line write (spec §4.6
    /// `append`, R2).
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError::NotFound`] if no log exists for `key`,
    /// or [`SessionStoreError::Io`] if the append fails.
    pub fn append(&self, key: &SessionKey, message: &SessionMessage) -> SessionStoreResult<()> {
        let path = self.path_for(key);
        if !path.exists() {
            return Err(SessionStoreError::NotFound(key.as_wire()));
        }
        let line = serde_json::to_string(message)?;
        let mut file = std::fs::OpenOptions::new().append(true).open(&path)?;
        writeln!(file, "{line}")?;
        file.flush()?;
        Ok(())
    }

    /// Load a conversation from disk, applying any compaction records and
    /// skipping malformed lines (spec §4.6 `load`, R2).
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError::NotFound`] if no log exists, or
    /// [`SessionStoreError::MissingMetadata`] if the first line isn't a
    /// valid `session_meta` record.
    pub fn load(&self, key: &SessionKey) -> SessionStoreResult<ConversationSession> {
        let path = self.path_for(key);
        let text = std::fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SessionStoreError::NotFound(key.as_wire())
            } else {
                SessionStoreError::Io(e)
            }
        })?;
        let mut lines = text.lines();

        let meta_line = lines.next().ok_or_else(|| SessionStoreError::MissingMetadata(key.as_wire()))?;
        let Some(ParsedLine::Meta(meta)) = parse_line(meta_line) else {
            return Err(SessionStoreError::MissingMetadata(key.as_wire()));
        };

        let mut messages = Vec::new();
        let mut compaction_summary = None;
        let mut updated_at = meta.created_at;

        for line in lines {
            match parse_line(line) {
                Some(ParsedLine::Message(msg)) => {
                    updated_at = msg.timestamp;
                    messages.push(msg);
                }
                Some(ParsedLine::Compaction(record)) => {
                    compaction_summary = Some(record.summary);
                    updated_at = record.timestamp;
                }
                Some(ParsedLine::Meta(_)) | None => {
                    tracing::debug!("skipping malformed or unexpected session log line");
                }
            }
        }

        Ok(ConversationSession {
            key: key.clone(),
            project_path: meta.project_path,
            compaction_summary,
            messages,
            created_at: meta.created_at,
            updated_at,
        })
    }

    /// List session logs under this store, newest-modified first (spec
    /// §4.6 `list_sessions`).
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError::Io`] if the directory cannot be scanned.
    pub fn list_sessions(
        &self,
        agent_id: Option<&str>,
        limit: usize,
    ) -> SessionStoreResult<Vec<SessionSummary>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&self.sessions_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(std::ffi::OsStr::to_str) != Some("log") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(std::ffi::OsStr::to_str) else {
                continue;
            };
            let Some(key) = SessionKey::parse_file_stem(stem) else {
                continue;
            };
            if let Some(filter) = agent_id {
                if key.agent_id != filter {
                    continue;
                }
            }

            let Ok(session) = self.load(&key) else {
                continue;
            };
            let modified_at = entry.metadata()?.modified()?;
            entries.push(SessionSummary {
                key,
                project_path: session.project_path,
                message_count: session.messages.len(),
                modified_at,
            });
        }
        entries.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
        entries.truncate(limit);
        Ok(entries)
    }

    /// Compact a session's log if it exceeds `keep_recent` messages,
    /// rewriting the file atomically (write-temp-then-rename): metadata
    /// line, compaction record, then the kept messages verbatim (spec §4.6
    /// `compact`, I8, P10).
    ///
    /// No-op (returns `Ok(None)`) if the session has `keep_recent` or fewer
    /// messages.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError`] if the log cannot be read or the
    /// atomic rewrite fails.
    pub fn compact(
        &self,
        key: &SessionKey,
        summary: impl Into<String>,
        keep_recent: usize,
    ) -> SessionStoreResult<Option<usize>> {
        let session = self.load(key)?;
        if session.messages.len() <= keep_recent {
            return Ok(None);
        }

        let (kept, dropped) = select_kept_suffix(&session.messages, keep_recent);

        let meta = MetaLine {
            kind: "session_meta".to_string(),
            key: key.as_wire(),
            project_path: session.project_path.clone(),
            created_at: session.created_at,
        };
        let compaction = CompactionLine {
            kind: "compaction".to_string(),
            summary: summary.into(),
            compacted_count: dropped,
            timestamp: Timestamp::now(),
        };

        let path = self.path_for(key);
        let tmp_path = path.with_extension("log.tmp");
        {
            let mut tmp = std::fs::File::create(&tmp_path)?;
            writeln!(tmp, "{}", serde_json::to_string(&meta)?)?;
            writeln!(tmp, "{}", serde_json::to_string(&compaction)?)?;
            for msg in &kept {
                writeln!(tmp, "{}", serde_json::to_string(msg)?)?;
            }
            tmp.flush()?;
        }
        std::fs::rename(&tmp_path, &path)?;

        Ok(Some(dropped))
    }

    /// Delete a session's log file (spec §4.6 `delete`).
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError::Io`] if the file exists but cannot be
    /// removed. Deleting an already-absent log is not an error.
    pub fn delete(&self, key: &SessionKey) -> SessionStoreResult<()> {
        let path = self.path_for(key);
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionStoreError::Io(e)),
        }
    }

    /// Scan the sessions directory, returning every recoverable session key
    /// (spec §4.6 `recover_all`).
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError::Io`] if the directory cannot be scanned.
    pub fn recover_all(&self) -> SessionStoreResult<Vec<SessionKey>> {
        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.sessions_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(std::ffi::OsStr::to_str) != Some("log") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(std::ffi::OsStr::to_str) {
                if let Some(key) = SessionKey::parse_file_stem(stem) {
                    keys.push(key);
                }
            }
        }
        Ok(keys)
    }
}

impl From<serde_json::Error> for SessionStoreError {
    fn from(e: serde_json::Error) -> Self {
        SessionStoreError::Io(std::io::Error::other(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, SessionStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path().join("sessions")).unwrap();
        (dir, store)
    }

    #[test]
    fn create_then_load_round_trips_metadata() {
        let (_dir, store) = store();
        let session = store.create("agent1", Some("sess1".to_string()), "/tmp/proj").unwrap();
        let loaded = store.load(&session.key).unwrap();
        assert_eq!(loaded.project_path, "/tmp/proj");
        assert!(loaded.messages.is_empty());
    }

    #[test]
    fn append_then_load_preserves_insertion_order() {
        let (_dir, store) = store();
        let session = store.create("agent1", Some("sess1".to_string()), "/tmp/proj").unwrap();
        store.append(&session.key, &SessionMessage::new("user", Some("one".to_string()))).unwrap();
        store.append(&session.key, &SessionMessage::new("assistant", Some("two".to_string()))).unwrap();
        store.append(&session.key, &SessionMessage::new("user", Some("three".to_string()))).unwrap();

        let loaded = store.load(&session.key).unwrap();
        let contents: Vec<_> = loaded.messages.iter().map(|m| m.content.clone().unwrap()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
    }

    #[test]
    fn append_to_unknown_session_fails() {
        let (_dir, store) = store();
        let key = SessionKey::new("ghost", "nope");
        let err = store.append(&key, &SessionMessage::new("user", None)).unwrap_err();
        assert!(matches!(err, SessionStoreError::NotFound(_)));
    }

    #[test]
    fn load_skips_malformed_lines() {
        let (_dir, store) = store();
        let session = store.create("agent1", Some("sess1".to_string()), "").unwrap();
        store.append(&session.key, &SessionMessage::new("user", Some("ok".to_string()))).unwrap();

        let path = store.path_for(&session.key);
        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{not valid json").unwrap();

        let loaded = store.load(&session.key).unwrap();
        assert_eq!(loaded.messages.len(), 1);
    }

    #[test]
    fn compact_keeps_last_k_messages_plus_summary() {
        let (_dir, store) = store();
        let session = store.create("agent1", Some("sess1".to_string()), "").unwrap();
        for i in 0..30 {
            store
                .append(&session.key, &SessionMessage::new("user", Some(format!("msg-{i}"))))
                .unwrap();
        }

        let dropped = store.compact(&session.key, "summary of early history", 20).unwrap();
        assert_eq!(dropped, Some(10));

        let loaded = store.load(&session.key).unwrap();
        assert_eq!(loaded.messages.len(), 20);
        assert_eq!(loaded.compaction_summary.as_deref(), Some("summary of early history"));
        assert_eq!(loaded.messages[0].content.as_deref(), Some("msg-10"));
        assert_eq!(loaded.messages[19].content.as_deref(), Some("msg-29"));
    }

    #[test]
    fn compact_is_noop_under_the_keep_recent_threshold() {
        let (_dir, store) = store();
        let session = store.create("agent1", Some("sess1".to_string()), "").unwrap();
        store.append(&session.key, &SessionMessage::new("user", Some("one".to_string()))).unwrap();

        let dropped = store.compact(&session.key, "summary", 20).unwrap();
        assert_eq!(dropped, None);
    }

    #[test]
    fn compact_extends_window_to_keep_tool_call_units_intact() {
        let (_dir, store) = store();
        let session = store.create("agent1", Some("sess1".to_string()), "").unwrap();

        for i in 0..17 {
            store
                .append(&session.key, &SessionMessage::new("user", Some(format!("filler-{i}"))))
                .unwrap();
        }
        // A 3-message unit straddling the naive cut point at keep_recent=20.
        store
            .append(
                &session.key,
                &SessionMessage::assistant_tool_calls(vec![unclaude_core::ToolCallRequest {
                    id: "call-1".to_string(),
                    name: "bash_execute".to_string(),
                    arguments: serde_json::json!({}),
                }]),
            )
            .unwrap();
        store
            .append(&session.key, &SessionMessage::tool_response("call-1", "bash_execute", "ok"))
            .unwrap();
        store.append(&session.key, &SessionMessage::new("user", Some("after".to_string()))).unwrap();

        store.compact(&session.key, "summary", 20).unwrap();
        let loaded = store.load(&session.key).unwrap();

        // The unit (assistant+tool) must appear together, never split.
        let assistant_pos = loaded.messages.iter().position(SessionMessage::opens_tool_unit).unwrap();
        assert_eq!(loaded.messages[assistant_pos + 1].role, "tool");
    }

    #[test]
    fn delete_removes_the_log() {
        let (_dir, store) = store();
        let session = store.create("agent1", Some("sess1".to_string()), "").unwrap();
        store.delete(&session.key).unwrap();
        assert!(matches!(store.load(&session.key), Err(SessionStoreError::NotFound(_))));
    }

    #[test]
    fn delete_of_missing_session_is_not_an_error() {
        let (_dir, store) = store();
        let key = SessionKey::new("ghost", "nope");
        assert!(store.delete(&key).is_ok());
    }

    #[test]
    fn recover_all_lists_every_log_file() {
        let (_dir, store) = store();
        store.create("agent1", Some("sess1".to_string()), "").unwrap();
        store.create("agent2", Some("sess2".to_string()), "").unwrap();

        let mut keys = store.recover_all().unwrap();
        keys.sort_by_key(SessionKey::file_stem);
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn list_sessions_filters_by_agent_and_sorts_newest_first() {
        let (_dir, store) = store();
        store.create("agent1", Some("a".to_string()), "").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(10));
        store.create("agent1", Some("b".to_string()), "").unwrap();
        store.create("agent2", Some("c".to_string()), "").unwrap();

        let summaries = store.list_sessions(Some("agent1"), 10).unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].key.session_id, "b");
    }
}
