//! The closed enumeration of capability kinds (spec §3 Capability).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CapabilityError;

/// A capability: a named kind of operation a session may be authorized to
/// perform. The enumeration is closed — no dynamic/unknown variants — so
/// that the Tool-Capability Map (GLOSSARY) and policy presets can be
/// exhaustively matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Read file contents.
    FileRead,
    /// Write or edit file contents.
    FileWrite,
    /// Delete a file.
    FileDelete,
    /// Glob-match files.
    FileGlob,
    /// Grep file contents.
    FileGrep,
    /// List a directory.
    DirList,
    /// Create a directory.
    DirCreate,
    /// Execute a command from a fixed, non-shell-interpreted allowlist.
    ExecSafe,
    /// Execute an arbitrary shell command.
    ExecShell,
    /// Launch a background/detached process.
    ExecBackground,
    /// Fetch a URL.
    NetFetch,
    /// POST to a URL.
    NetPost,
    /// Web search.
    NetSearch,
    /// Open a websocket connection.
    NetWebsocket,
    /// Read git repository state.
    GitRead,
    /// Write git repository state (commit, stage).
    GitWrite,
    /// Push to a remote.
    GitPush,
    /// Create/switch branches.
    GitBranch,
    /// Read hierarchical memory.
    MemoryRead,
    /// Write hierarchical memory.
    MemoryWrite,
    /// Delete hierarchical memory.
    MemoryDelete,
    /// Spawn a subagent.
    AgentSpawn,
    /// Run a subagent in the background.
    AgentBackground,
    /// Connect to an MCP server.
    McpConnect,
    /// Execute an MCP tool.
    McpExecute,
    /// Navigate a browser.
    BrowserNavigate,
    /// Interact with page elements.
    BrowserInteract,
    /// Capture a browser screenshot.
    BrowserScreenshot,
    /// Modify system/daemon configuration.
    SystemConfig,
}

impl Capability {
    /// All capability variants, in declaration order (spec §3 enumeration order).
    #[must_use]
    pub const fn all() -> &'static [Capability] {
        use Capability::*;
        &[
            FileRead,
            FileWrite,
            FileDelete,
            FileGlob,
            FileGrep,
            DirList,
            DirCreate,
            ExecSafe,
            ExecShell,
            ExecBackground,
            NetFetch,
            NetPost,
            NetSearch,
            NetWebsocket,
            GitRead,
            GitWrite,
            GitPush,
            GitBranch,
            MemoryRead,
            MemoryWrite,
            MemoryDelete,
            AgentSpawn,
            AgentBackground,
            McpConnect,
            McpExecute,
            BrowserNavigate,
            BrowserInteract,
            BrowserScreenshot,
            SystemConfig,
        ]
    }

    /// The wire/display name (`file.read`, `exec.shell`, ...) used in audit
    /// events, config files, and delegation capability URIs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        use Capability::*;
        match self {
            FileRead => "file.read",
            FileWrite => "file.write",
            FileDelete => "file.delete",
            FileGlob => "file.glob",
            FileGrep => "file.grep",
            DirList => "dir.list",
            DirCreate => "dir.create",
            ExecSafe => "exec.safe",
            ExecShell => "exec.shell",
            ExecBackground => "exec.background",
            NetFetch => "net.fetch",
            NetPost => "net.post",
            NetSearch => "net.search",
            NetWebsocket => "net.websocket",
            GitRead => "git.read",
            GitWrite => "git.write",
            GitPush => "git.push",
            GitBranch => "git.branch",
            MemoryRead => "memory.read",
            MemoryWrite => "memory.write",
            MemoryDelete => "memory.delete",
            AgentSpawn => "agent.spawn",
            AgentBackground => "agent.background",
            McpConnect => "mcp.connect",
            McpExecute => "mcp.execute",
            BrowserNavigate => "browser.navigate",
            BrowserInteract => "browser.interact",
            BrowserScreenshot => "browser.screenshot",
            SystemConfig => "system.config",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Capability {
    type Err = CapabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CapabilityError::UnknownCapability(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_display_and_from_str() {
        for cap in Capability::all() {
            let s = cap.to_string();
            assert_eq!(s.parse::<Capability>().unwrap(), *cap);
        }
    }

    #[test]
    fn unknown_string_is_rejected() {
        assert!("file.teleport".parse::<Capability>().is_err());
    }

    #[test]
    fn serializes_as_snake_case_wire_name() {
        let json = serde_json::to_string(&Capability::ExecShell).unwrap();
        assert_eq!(json, "\"exec_shell\"");
    }
}
