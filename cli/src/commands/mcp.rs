//! Serve one tool server over MCP stdio

use crate::config::CliConfigLoader;
use anyhow::{anyhow, Result};
use tether_core::tools::{McpServer, ToolRegistry, ToolServer};

/// Run `server` until stdin closes. Launched by the agent CLI, not by users.
pub async fn mcp_command(loader: CliConfigLoader, server: String) -> Result<()> {
    let tool_server = ToolServer::find(&server).ok_or_else(|| {
        let known: Vec<&str> = ToolServer::all().iter().map(|s| s.name).collect();
        anyhow!(
            "Unknown tool server '{}'. Available: {}",
            server,
            known.join(", ")
        )
    })?;

    let settings = loader.load().await?;
    let registry = ToolRegistry::with_notes_dir(settings.notes_dir());

    McpServer::new(tool_server, tool_server.executor(&registry))
        .serve_stdio()
        .await?;
    Ok(())
}
