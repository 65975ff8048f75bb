//! Shared test fixtures for the unclaude workspace (spec §6 [AMBIENT] Test
//! tooling).
//!
//! A dev-dependency of crates that exercise the external-collaborator
//! interfaces from `unclaude-core` (`LlmClient`, `Tool`, `MemoryStore`)
//! without pulling in a real provider or tool implementation.

#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]

mod mock_context;
mod mock_llm;
mod mock_tool;
mod state_dir;

pub use mock_context::{MockCompactor, MockPruner};
pub use mock_llm::{MockLlmClient, ScriptedTurn};
pub use mock_tool::MockTool;
pub use state_dir::temp_state_dir;
