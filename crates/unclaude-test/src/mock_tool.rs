//! A scripted [`Tool`] for exercising the policy-gated tool dispatch path
//! without a real file/shell/network implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use unclaude_core::{Tool, ToolOutput};

/// A tool that always returns the same canned result and counts invocations.
pub struct MockTool {
    name: String,
    result: ToolOutput,
    calls: AtomicUsize,
}

impl MockTool {
    /// Build a mock tool named `name` that always succeeds with `output`.
    #[must_use]
    pub fn succeeding(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            result: ToolOutput {
                success: true,
                output: output.into(),
                error: None,
            },
            calls: AtomicUsize::new(0),
        }
    }

    /// Build a mock tool named `name` that always fails with `error`.
    #[must_use]
    pub fn failing(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            result: ToolOutput {
                success: false,
                output: String::new(),
                error: Some(error.into()),
            },
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of times `execute` was called.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tool for MockTool {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _args: &HashMap<String, serde_json::Value>) -> ToolOutput {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn succeeding_tool_counts_calls() {
        let tool = MockTool::succeeding("bash_execute", "ok");
        let out = tool.execute(&HashMap::new()).await;
        assert!(out.success);
        assert_eq!(tool.call_count(), 1);
    }

    #[tokio::test]
    async fn failing_tool_reports_error() {
        let tool = MockTool::failing("bash_execute", "boom");
        let out = tool.execute(&HashMap::new()).await;
        assert!(!out.success);
        assert_eq!(out.error.as_deref(), Some("boom"));
    }
}
