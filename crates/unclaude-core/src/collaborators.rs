//! External collaborator interfaces (spec §6): the LLM client, tool, and
//! memory store contracts the daemon consumes but does not implement.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single chat message in an LLM conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `system`, `user`, `assistant`, or `tool`.
    pub role: String,
    /// Text content; `None` for an assistant message that is pure tool calls.
    pub content: Option<String>,
    /// Tool calls emitted by the assistant, if any.
    #[serde(default)]
    pub tool_calls: Vec<ToolCallRequest>,
    /// The tool call this message answers, if `role == "tool"`.
    pub tool_call_id: Option<String>,
    /// Tool name, set when `role == "tool"`.
    pub name: Option<String>,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Provider-assigned call ID, echoed back in the tool result message.
    pub id: String,
    /// Tool name (keys the Tool-Capability Map).
    pub name: String,
    /// Parsed arguments.
    pub arguments: serde_json::Value,
}

/// Token accounting returned alongside a chat completion.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    /// Prompt/input tokens.
    pub prompt_tokens: u64,
    /// Completion/output tokens.
    pub completion_tokens: u64,
    /// Sum of the two; providers that omit it are backfilled by the caller.
    pub total_tokens: u64,
}

/// A completed chat turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Assistant text, when the model did not call tools.
    pub content: Option<String>,
    /// Tool calls the model wants executed.
    #[serde(default)]
    pub tool_calls: Vec<ToolCallRequest>,
    /// Usage for this call.
    pub usage: Usage,
}

/// Error surfaced by an [`LlmClient`] call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    /// Network-level or provider-side transient failure.
    #[error("llm transient error: {0}")]
    Transient(String),
    /// The provider rejected the request outright (bad auth, bad schema).
    #[error("llm request error: {0}")]
    Request(String),
}

/// The external LLM provider client (spec §6: out of scope, interface only).
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a chat completion request, optionally with tool definitions.
    async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools_enabled: bool,
    ) -> Result<ChatResponse, LlmError>;
}

/// Error surfaced by a [`Tool`] execution.
#[derive(Debug, Clone, thiserror::Error)]
#[error("tool execution failed: {0}")]
pub struct ToolError(pub String);

/// Result of executing a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Whether the tool succeeded.
    pub success: bool,
    /// Human/LLM-readable output text.
    pub output: String,
    /// Error detail, set when `success == false`.
    pub error: Option<String>,
}

/// A tool implementation (spec §6: out of scope, interface only).
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable tool name, used to key the Tool-Capability Map.
    fn name(&self) -> &str;
    /// Whether invoking this tool requires an approval/capability check
    /// before execution (almost always true for this core).
    fn requires_permission(&self) -> bool {
        true
    }
    /// Execute the tool with validated arguments.
    async fn execute(&self, args: &HashMap<String, serde_json::Value>) -> ToolOutput;
}

/// A recalled memory node (spec §6 Memory store: `search` return shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryNode {
    /// Stored content.
    pub content: String,
    /// Memory layer/tier the node belongs to.
    pub layer: String,
    /// Caller-assigned importance, used for ranking and pruning.
    pub importance: f32,
    /// Free-form tags.
    pub tags: Vec<String>,
}

/// The hierarchical memory store (spec §6: out of scope, interface only).
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Persist a memory node.
    async fn store(
        &self,
        content: &str,
        layer: &str,
        importance: f32,
        tags: &[String],
        project_path: Option<&str>,
    );

    /// Search recalled memory nodes.
    async fn search(
        &self,
        query: &str,
        layer: Option<&str>,
        project_path: Option<&str>,
        limit: usize,
    ) -> Vec<MemoryNode>;
}

/// A messaging bridge (Telegram/WhatsApp/webhook — spec §6: out of scope,
/// interface only). The daemon broadcasts idle/shutdown status through
/// whichever bridges are configured; it never depends on a concrete
/// transport.
#[async_trait]
pub trait MessagingBridge: Send + Sync {
    /// Stable bridge name, used in logs (`"telegram"`, `"webhook"`, ...).
    fn name(&self) -> &str;

    /// Send a free-form status/notification line to the bridge's configured
    /// recipient(s). Best-effort: implementations should not panic on
    /// transport failure, only log it.
    async fn notify(&self, message: &str);
}

/// The context compactor (spec §6: out of scope, interface only). Invoked by
/// the daemon's agent loop when a conversation's history has grown past its
/// compaction threshold; produces the replacement summary text that
/// `unclaude-sessions::SessionStore::compact` stores in place of the
/// dropped messages.
#[async_trait]
pub trait ContextCompactor: Send + Sync {
    /// Summarize `messages` into text that preserves enough context for the
    /// conversation to continue coherently.
    async fn summarize(&self, messages: &[ChatMessage]) -> String;
}

/// The context pruner (spec §6: out of scope, interface only). Invoked on
/// every agent iteration, after compaction, to fit the message list the
/// daemon is about to send an LLM within a token budget.
pub trait ContextPruner: Send + Sync {
    /// Return a subsequence of `messages` (oldest dropped first, after any
    /// leading system message) estimated to fit within `max_tokens`.
    fn prune(&self, messages: Vec<ChatMessage>, max_tokens: usize) -> Vec<ChatMessage>;
}
