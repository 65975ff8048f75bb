//! A scripted, canned-response [`LlmClient`] for deterministic daemon/agent
//! loop tests.

use std::sync::Mutex;

use async_trait::async_trait;
use unclaude_core::{ChatMessage, ChatResponse, LlmClient, LlmError, ToolCallRequest, Usage};

/// One scripted response the mock will return, in order.
#[derive(Debug, Clone)]
pub enum ScriptedTurn {
    /// Return plain assistant text, ending the agent loop.
    Text(String),
    /// Return one or more tool calls.
    ToolCalls(Vec<ToolCallRequest>),
    /// Fail with a transient error (exercises router fallback paths).
    TransientError(String),
}

/// An [`LlmClient`] that plays back a fixed script of responses, one per
/// `chat()` call, and counts how many times it was invoked.
pub struct MockLlmClient {
    script: Mutex<Vec<ScriptedTurn>>,
    calls: Mutex<usize>,
}

impl MockLlmClient {
    /// Build a mock that plays `script` in order, oldest first.
    #[must_use]
    pub fn new(script: Vec<ScriptedTurn>) -> Self {
        Self {
            script: Mutex::new(script),
            calls: Mutex::new(0),
        }
    }

    /// A mock that always returns the same final-answer text.
    #[must_use]
    pub fn always_text(text: impl Into<String>) -> Self {
        Self::new(vec![ScriptedTurn::Text(text.into())])
    }

    /// Number of `chat()` calls made so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn chat(
        &self,
        _model: &str,
        _messages: &[ChatMessage],
        _tools_enabled: bool,
    ) -> Result<ChatResponse, LlmError> {
        *self.calls.lock().unwrap_or_else(|e| e.into_inner()) += 1;

        let next = {
            let mut script = self.script.lock().unwrap_or_else(|e| e.into_inner());
            if script.is_empty() {
                None
            } else {
                Some(script.remove(0))
            }
        };

        match next {
            Some(ScriptedTurn::Text(text)) => Ok(ChatResponse {
                content: Some(text),
                tool_calls: Vec::new(),
                usage: Usage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                },
            }),
            Some(ScriptedTurn::ToolCalls(calls)) => Ok(ChatResponse {
                content: None,
                tool_calls: calls,
                usage: Usage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                },
            }),
            Some(ScriptedTurn::TransientError(msg)) => Err(LlmError::Transient(msg)),
            None => Ok(ChatResponse {
                content: Some("(mock exhausted)".to_string()),
                tool_calls: Vec::new(),
                usage: Usage::default(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn plays_back_script_in_order() {
        let mock = MockLlmClient::new(vec![
            ScriptedTurn::ToolCalls(vec![ToolCallRequest {
                id: "1".to_string(),
                name: "bash_execute".to_string(),
                arguments: serde_json::json!({"command": "ls"}),
            }]),
            ScriptedTurn::Text("done".to_string()),
        ]);

        let first = mock.chat("test-model", &[], true).await.unwrap();
        assert_eq!(first.tool_calls.len(), 1);

        let second = mock.chat("test-model", &[], true).await.unwrap();
        assert_eq!(second.content.as_deref(), Some("done"));

        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn transient_error_is_surfaced() {
        let mock = MockLlmClient::new(vec![ScriptedTurn::TransientError("rate limited".to_string())]);
        let err = mock.chat("test-model", &[], false).await.unwrap_err();
        assert!(matches!(err, LlmError::Transient(msg) if msg == "rate limited"));
    }
}
