//! The fixed Tool-Capability Map (GLOSSARY): tool name → required capability.

use unclaude_capabilities::Capability;

/// Look up the capability required to run `tool_name`, per the fixed table.
///
/// Returns `None` for unrecognized tool names; callers should treat an
/// unmapped tool as a configuration error rather than silently allowing it.
#[must_use]
pub fn capability_for_tool(tool_name: &str) -> Option<Capability> {
    match tool_name {
        "file_read" => Some(Capability::FileRead),
        "file_write" | "file_edit" => Some(Capability::FileWrite),
        "file_glob" => Some(Capability::FileGlob),
        "file_grep" => Some(Capability::FileGrep),
        "directory_list" => Some(Capability::DirList),
        "bash_execute" => Some(Capability::ExecShell),
        "web_fetch" => Some(Capability::NetFetch),
        "web_search" => Some(Capability::NetSearch),
        "memory_search" => Some(Capability::MemoryRead),
        "memory_save" => Some(Capability::MemoryWrite),
        "spawn_subagent" => Some(Capability::AgentSpawn),
        "browser_tool" => Some(Capability::BrowserNavigate),
        "git" => Some(Capability::GitRead),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_tools() {
        assert_eq!(capability_for_tool("bash_execute"), Some(Capability::ExecShell));
        assert_eq!(capability_for_tool("file_edit"), Some(Capability::FileWrite));
        assert_eq!(capability_for_tool("git"), Some(Capability::GitRead));
    }

    #[test]
    fn unknown_tool_is_unmapped() {
        assert_eq!(capability_for_tool("teleport"), None);
    }
}
