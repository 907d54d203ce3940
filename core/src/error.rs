//! Error types and handling for tether core

use thiserror::Error;

/// Result type alias for tether operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for tether core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Transport errors (agent process connection and stream)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Session state errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Tool execution errors
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for field '{field}': {value}")]
    InvalidValue { field: String, value: String },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },
}

/// Errors raised by a transport to the agent runtime.
///
/// The resilient client only ever retries [`TransportError::ConnectionBroken`],
/// and only once, at the start of a turn.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No usable agent CLI executable was found
    #[error("Agent CLI not found (searched: {searched})")]
    CliNotFound { searched: String },

    /// The transport could not be established
    #[error("Failed to connect to agent: {message}")]
    Connect { message: String },

    /// The connection broke while delivering a request (retryable once)
    #[error("Connection broken: {message}")]
    ConnectionBroken { message: String },

    /// The response stream ended abnormally before end of turn
    #[error("Stream ended abnormally: {message}")]
    Stream { message: String },

    /// Any other failure (never retried)
    #[error("{message}")]
    Other { message: String },
}

impl TransportError {
    pub fn connection_broken<S: Into<String>>(message: S) -> Self {
        Self::ConnectionBroken {
            message: message.into(),
        }
    }

    pub fn stream<S: Into<String>>(message: S) -> Self {
        Self::Stream {
            message: message.into(),
        }
    }

    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Whether this error is the retryable connection-broken condition
    pub fn is_connection_broken(&self) -> bool {
        matches!(self, Self::ConnectionBroken { .. })
    }
}

/// Session state errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("No reply is streaming (session state: {state})")]
    NotStreaming { state: String },

    #[error("Session has no live transport")]
    NotConnected,
}

/// Tool execution errors
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool not found: {name}")]
    NotFound { name: String },

    #[error("Tool execution failed: {name} - {message}")]
    ExecutionFailed { name: String, message: String },

    #[error("Invalid tool parameters: {message}")]
    InvalidParameters { message: String },
}
