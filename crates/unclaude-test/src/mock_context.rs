//! Scripted [`ContextCompactor`]/[`ContextPruner`] fixtures for daemon loop
//! tests that exercise compaction and pruning without a real summarizer.

use async_trait::async_trait;
use unclaude_core::{ChatMessage, ContextCompactor, ContextPruner};

/// A compactor that always returns the same canned summary text.
pub struct MockCompactor {
    summary: String,
}

impl MockCompactor {
    /// Build a mock that always summarizes to `summary`.
    #[must_use]
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
        }
    }
}

#[async_trait]
impl ContextCompactor for MockCompactor {
    async fn summarize(&self, _messages: &[ChatMessage]) -> String {
        self.summary.clone()
    }
}

/// A pruner that keeps only the most recent `keep` messages.
pub struct MockPruner {
    keep: usize,
}

impl MockPruner {
    /// Build a mock that keeps at most `keep` trailing messages regardless
    /// of `max_tokens`.
    #[must_use]
    pub fn new(keep: usize) -> Self {
        Self { keep }
    }
}

impl ContextPruner for MockPruner {
    fn prune(&self, messages: Vec<ChatMessage>, _max_tokens: usize) -> Vec<ChatMessage> {
        let start = messages.len().saturating_sub(self.keep);
        messages[start..].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(content: &str) -> ChatMessage {
        ChatMessage {
            role: "user".to_string(),
            content: Some(content.to_string()),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    #[tokio::test]
    async fn compactor_returns_canned_summary() {
        let compactor = MockCompactor::new("summarized");
        assert_eq!(compactor.summarize(&[msg("a")]).await, "summarized");
    }

    #[test]
    fn pruner_keeps_only_trailing_messages() {
        let pruner = MockPruner::new(2);
        let kept = pruner.prune(vec![msg("a"), msg("b"), msg("c")], 1000);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].content.as_deref(), Some("b"));
    }
}
