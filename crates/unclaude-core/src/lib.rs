//! Shared identifiers, timestamps, and external-collaborator traits used
//! throughout the security core. Every other crate in the workspace depends
//! on this one for its common vocabulary — no crate redefines `SessionId`,
//! `Timestamp`, or `RiskLevel` locally.

#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod collaborators;
pub mod dirs;
mod types;

pub use collaborators::{
    ChatMessage, ChatResponse, ContextCompactor, ContextPruner, LlmClient, LlmError, MemoryNode,
    MemoryStore, MessagingBridge, Tool, ToolCallRequest, ToolError, ToolOutput, Usage,
};
pub use dirs::UnclaudeHome;
pub use types::{AgentId, DelegationId, Priority, RiskLevel, SessionId, TaskId, Timestamp};
