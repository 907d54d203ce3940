//! Transport abstractions between a session and the agent runtime
//!
//! A [`Connector`] acquires a fresh [`Transport`] for a set of [`AgentOptions`]. The
//! transport delivers one prompt at a time and yields the reply as a sequence of
//! [`StreamItem`]s terminated by [`StreamItem::EndOfTurn`].

pub mod cli;
pub mod preflight;
pub mod protocol;

pub use cli::{CliConnector, CliTransport};
pub use preflight::{resolve_cli, CliInfo, CLI_CANDIDATES};

use crate::config::AgentOptions;
use crate::error::TransportError;
use async_trait::async_trait;
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result type for transport operations
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// A live connection to the agent runtime
#[async_trait]
pub trait Transport: Send {
    /// Deliver a prompt
    async fn submit(&mut self, prompt: &str) -> TransportResult<()>;

    /// Wait for the next item of the current reply
    async fn next_fragment(&mut self) -> TransportResult<StreamItem>;

    /// Close the connection (best-effort)
    async fn disconnect(&mut self) -> TransportResult<()>;
}

/// Acquires transports bound to a configuration
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, options: &AgentOptions) -> TransportResult<Box<dyn Transport>>;
}

/// A piece of a streamed reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Fragment {
    /// Assistant text
    Text { text: String },

    /// The agent invoked a tool
    ToolInvocation {
        id: String,
        name: String,
        input: Value,
    },

    /// A tool returned
    ToolResult {
        tool_use_id: String,
        content: Option<Value>,
        is_error: bool,
    },
}

impl Fragment {
    pub fn text<S: Into<String>>(text: S) -> Self {
        Fragment::Text { text: text.into() }
    }

    /// First non-empty text part of a tool result, if any
    pub fn result_text(&self) -> Option<String> {
        let Fragment::ToolResult {
            content: Some(content),
            ..
        } = self
        else {
            return None;
        };

        match content {
            Value::String(text) => Some(text.trim().to_string()).filter(|t| !t.is_empty()),
            Value::Array(parts) => parts
                .iter()
                .filter(|part| part.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .map(|text| text.trim().to_string())
                .find(|text| !text.is_empty()),
            _ => None,
        }
    }
}

/// End-of-turn metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnSummary {
    /// Model reported by the first assistant message of the turn
    pub model: Option<String>,
    /// Token usage as reported by the runtime
    pub usage: Option<Value>,
    /// Total cost of the turn in USD
    pub total_cost_usd: Option<f64>,
    /// Wall time of the turn
    pub duration_ms: Option<u64>,
    /// Whether the runtime flagged the turn as an error
    pub is_error: bool,
    /// Result subtype (e.g. "success")
    pub subtype: Option<String>,
}

/// Item yielded while a reply streams
#[derive(Debug, Clone, PartialEq)]
pub enum StreamItem {
    Fragment(Fragment),
    EndOfTurn(TurnSummary),
}

/// Lazily pull one reply from `transport`.
///
/// The stream ends after the end-of-turn item or after the first error.
pub fn reply_stream<'a>(
    transport: &'a mut (dyn Transport + 'static),
) -> impl Stream<Item = TransportResult<StreamItem>> + Send + 'a {
    stream::unfold(Some(transport), |state| async move {
        let transport = state?;
        match transport.next_fragment().await {
            Ok(StreamItem::EndOfTurn(summary)) => Some((Ok(StreamItem::EndOfTurn(summary)), None)),
            Ok(item) => Some((Ok(item), Some(transport))),
            Err(e) => Some((Err(e), None)),
        }
    })
}
