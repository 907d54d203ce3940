//! CLI command implementations

pub mod chat;
pub mod check;
pub mod inspire;
pub mod mcp;
pub mod notes;
pub mod outline;
pub mod tools;

pub use chat::chat_command;
pub use check::check_command;
pub use inspire::inspire_command;
pub use mcp::mcp_command;
pub use notes::notes_command;
pub use outline::outline_command;
pub use tools::tools_command;

use crate::prompts::CLI_INSTALL_HELP;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tether_core::tools::{ToolServer, NOTES_UTIL};
use tether_core::transport::{resolve_cli, CliInfo};
use tether_core::error::TransportError;
use tether_core::{AppSettings, FailureReason, McpServerSpec};
use tracing::info;

/// Model used by every bundled application unless configured otherwise
pub const DEFAULT_MODEL: &str = "sonnet";

/// Describe how the agent CLI should launch one of our tool servers.
///
/// The server runs as `tether mcp <name>` from the current executable.
pub fn mcp_server_spec(server: ToolServer, settings: &AppSettings) -> Result<McpServerSpec> {
    let exe = std::env::current_exe().context("Failed to locate the tether executable")?;

    let mut args = Vec::new();
    if server.name == NOTES_UTIL.name {
        let notes_dir = absolute(&settings.notes_dir())?;
        args.push("--notes-dir".to_string());
        args.push(notes_dir.display().to_string());
    }
    args.push("mcp".to_string());
    args.push(server.name.to_string());

    Ok(McpServerSpec::new(exe.display().to_string(), args))
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    Ok(cwd.join(path))
}

/// Locate the agent CLI, printing install instructions when it is missing
pub async fn preflight(settings: &AppSettings) -> Result<CliInfo> {
    match resolve_cli(settings.cli_path.as_deref()).await {
        Ok(cli) => {
            info!("Using {} ({}) at {}", cli.command, cli.version, cli.path.display());
            Ok(cli)
        }
        Err(e) => {
            eprintln!("{}", CLI_INSTALL_HELP);
            Err(e).context("Agent CLI preflight failed")
        }
    }
}

/// Explain an undelivered prompt, with install instructions when the CLI vanished
pub fn failure_detail(reason: &FailureReason) -> String {
    match reason.error() {
        TransportError::CliNotFound { .. } => format!("{}\n\n{}", reason, CLI_INSTALL_HELP),
        _ => reason.to_string(),
    }
}
