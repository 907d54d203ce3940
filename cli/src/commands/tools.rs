//! Tools listing command

use crate::output::formatters::format_input;
use anyhow::Result;
use tether_core::tools::{ToolRegistry, ToolServer};
use tracing::info;

/// Show the tool servers, the tools each one serves and their usage examples
pub async fn tools_command() -> Result<()> {
    info!("Listing available tools");

    println!("🛠️  Available Tools\n");

    let registry = ToolRegistry::default();
    for server in ToolServer::all() {
        println!("🔌 {} (v{})", server.name, server.version);
        for name in server.tools {
            if let Some((tool_name, description)) = registry.get_tool_info(name) {
                println!("   📦 {}", tool_name);
                // Show first line of description only for brevity
                let first_line = description.lines().next().unwrap_or(description);
                println!("      {}", first_line);
            }
            if let Some(tool) = registry.create_tool(name) {
                for example in tool.examples() {
                    println!(
                        "      e.g. {}: {} => {}",
                        example.description,
                        format_input(&example.parameters),
                        example.expected_result
                    );
                }
            }
        }
        println!();
    }

    println!("💡 The agent reaches these as mcp__<alias>__<tool> through `tether mcp <server>`.");

    Ok(())
}
