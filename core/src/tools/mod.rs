//! Tool system, built-in tools and the MCP tool server

pub mod base;
pub mod builtin;
pub mod mcp_server;
pub mod registry;
pub mod server;

pub use base::{Tool, ToolCall, ToolDefinition, ToolExample, ToolExecutor, ToolResult};
pub use mcp_server::McpServer;
pub use registry::{ToolFactory, ToolRegistry};
pub use server::{ToolServer, INSPIRE_UTIL, NOTES_UTIL, UTILITIES};
