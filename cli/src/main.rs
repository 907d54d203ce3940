//! # tether CLI
//!
//! Small agent applications over a resilient `claude` CLI client.
//!
//! ## Usage
//!
//! - `tether` / `tether chat` - Interactive chat
//! - `tether notes` - NoteSmith research assistant with local notes
//! - `tether inspire [topic...]` - One uplifting line
//! - `tether outline` - One-shot blog outline
//! - `tether tools` - Show the custom tools
//! - `tether check` - Verify the agent CLI is usable

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tether_core::PermissionMode;

mod commands;
mod config;
mod output;
mod prompts;

use commands::{
    chat_command, check_command, inspire_command, mcp_command, notes_command, outline_command,
    tools_command,
};
use config::CliConfigLoader;

/// tether - small agent applications over the claude CLI
#[derive(Parser)]
#[command(name = "tether")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Small agent applications over a resilient claude CLI client")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file or directory path
    #[arg(short, long, env = "TETHER_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Model name override
    #[arg(long, global = true)]
    model: Option<String>,

    /// Permission mode (default, acceptEdits, plan, bypassPermissions)
    #[arg(long, global = true)]
    permission_mode: Option<PermissionMode>,

    /// Working directory for the agent process
    #[arg(long, global = true)]
    cwd: Option<PathBuf>,

    /// Path to the claude CLI executable
    #[arg(long, global = true)]
    cli_path: Option<PathBuf>,

    /// Directory where notes are stored
    #[arg(long, global = true)]
    notes_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat with local utility tools
    Chat,

    /// NoteSmith: summarize pages, save and search notes
    Notes,

    /// InspireBot: print one short uplifting line
    Inspire {
        /// Topic for the quote
        topic: Vec<String>,
    },

    /// Generate a markdown blog outline
    Outline,

    /// Show available tools
    Tools,

    /// Check that the claude CLI is installed and runnable
    Check,

    /// Serve a tool server over MCP stdio
    #[command(hide = true)]
    Mcp {
        /// Tool server name
        server: String,
    },
}

/// Build a configuration loader from CLI arguments
fn build_config_loader(cli: &Cli) -> CliConfigLoader {
    let mut loader = CliConfigLoader::new();

    if let Some(config_path) = &cli.config {
        loader = loader.with_config_override(config_path.clone());
    }

    if let Some(model) = &cli.model {
        loader = loader.with_model_override(model.clone());
    }

    if let Some(mode) = cli.permission_mode {
        loader = loader.with_permission_mode_override(mode);
    }

    if let Some(cwd) = &cli.cwd {
        loader = loader.with_cwd_override(cwd.clone());
    }

    if let Some(cli_path) = &cli.cli_path {
        loader = loader.with_cli_path_override(cli_path.clone());
    }

    if let Some(notes_dir) = &cli.notes_dir {
        loader = loader.with_notes_dir_override(notes_dir.clone());
    }

    loader
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tether_core::init_tracing_with_debug(cli.verbose);

    let config_loader = build_config_loader(&cli);

    match cli.command {
        None | Some(Commands::Chat) => chat_command(config_loader).await,
        Some(Commands::Notes) => notes_command(config_loader).await,
        Some(Commands::Inspire { topic }) => inspire_command(config_loader, topic).await,
        Some(Commands::Outline) => outline_command(config_loader).await,
        Some(Commands::Tools) => tools_command().await,
        Some(Commands::Check) => check_command(config_loader).await,
        Some(Commands::Mcp { server }) => mcp_command(config_loader, server).await,
    }
}
