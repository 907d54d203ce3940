//! # tether Core
//!
//! Core library for tether - small agent applications over the `claude` CLI.
//!
//! This library provides the resilient request client (send with a single
//! reconnect-and-retry, streamed reply collection), the transport to the agent CLI,
//! tool-use hooks, and the custom tools served to the agent over MCP.

// Core modules
pub mod client;
pub mod config;
pub mod error;
pub mod hooks;
pub mod output;
pub mod session;
pub mod tools;
pub mod transport;

// Re-export commonly used types
pub use client::{CollectedReply, FailureReason, ResilientClient, SendOutcome, TurnOutcome};
pub use config::{AgentOptions, AppSettings, McpServerSpec, PermissionMode};
pub use error::{Error, Result};
pub use output::{NullOutput, ReplyEvent, ReplyOutput};
pub use session::{Session, SessionState, TurnStatus};
pub use transport::{Fragment, StreamItem, TurnSummary};

/// Current version of the tether-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing with a specific debug mode, logging to stderr.
///
/// `RUST_LOG` still wins when set.
pub fn init_tracing_with_debug(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
