//! Named groups of tools exposed to the agent as one MCP server

use crate::tools::{ToolExecutor, ToolRegistry};

/// A tool server definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolServer {
    pub name: &'static str,
    pub version: &'static str,
    pub tools: &'static [&'static str],
}

/// Arithmetic and clock helpers
pub const UTILITIES: ToolServer = ToolServer {
    name: "utilities",
    version: "1.0.0",
    tools: &["calculate", "now"],
};

/// Local note taking
pub const NOTES_UTIL: ToolServer = ToolServer {
    name: "notes_util",
    version: "1.0.0",
    tools: &["save_note", "find_note"],
};

/// Quote fallback for InspireBot
pub const INSPIRE_UTIL: ToolServer = ToolServer {
    name: "inspire_util",
    version: "1.0.0",
    tools: &["inspire_me"],
};

impl ToolServer {
    pub fn all() -> [ToolServer; 3] {
        [UTILITIES, NOTES_UTIL, INSPIRE_UTIL]
    }

    pub fn find(name: &str) -> Option<ToolServer> {
        Self::all().into_iter().find(|server| server.name == name)
    }

    /// Names the agent uses for these tools when the server is mounted as `alias`
    pub fn allowed_tool_names(&self, alias: &str) -> Vec<String> {
        self.tools
            .iter()
            .map(|tool| format!("mcp__{}__{}", alias, tool))
            .collect()
    }

    /// Instantiate the server's tools
    pub fn executor(&self, registry: &ToolRegistry) -> ToolExecutor {
        registry.create_executor(self.tools)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_tool_names_use_alias() {
        assert_eq!(
            UTILITIES.allowed_tool_names("utils"),
            vec!["mcp__utils__calculate", "mcp__utils__now"]
        );
        assert_eq!(
            INSPIRE_UTIL.allowed_tool_names("inspire_util"),
            vec!["mcp__inspire_util__inspire_me"]
        );
    }

    #[test]
    fn test_every_server_tool_is_registered() {
        let registry = ToolRegistry::default();
        for server in ToolServer::all() {
            let executor = server.executor(&registry);
            assert_eq!(executor.list_tools().len(), server.tools.len(), "{}", server.name);
        }
        assert_eq!(ToolServer::find("notes_util"), Some(NOTES_UTIL));
        assert!(ToolServer::find("nope").is_none());
    }
}
