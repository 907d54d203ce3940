//! Minimal configuration module for tether core
//!
//! Only exports resolved data types. All discovery and loading logic is in the CLI layer.

pub mod types;

pub use types::{AgentOptions, AppSettings, McpServerSpec, PermissionMode, DEFAULT_PERMISSION_MODE};
