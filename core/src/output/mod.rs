//! Output abstraction for streamed replies
//!
//! Core only provides the interface; terminal implementations live in the CLI crate.

use crate::transport::{Fragment, TurnSummary};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Error type returned by output handlers
pub type OutputError = Box<dyn std::error::Error + Send + Sync>;

/// Events emitted while a reply is collected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReplyEvent {
    /// New assistant text
    TextDelta { delta: String, accumulated: String },

    /// Tool use observed in the reply; never part of the reply text
    ToolActivity { fragment: Fragment },

    /// The collection finished, normally or not
    TurnFinished {
        text: String,
        truncated: bool,
        summary: Option<TurnSummary>,
    },
}

/// Receives reply events as they arrive
#[async_trait]
pub trait ReplyOutput: Send + Sync {
    /// Emit a reply event
    async fn emit_event(&self, event: ReplyEvent) -> Result<(), OutputError>;

    /// Whether this output wants `TextDelta` events; otherwise only `TurnFinished`
    /// carries the reply text
    fn supports_realtime_updates(&self) -> bool {
        true
    }

    /// Flush any buffered output
    async fn flush(&self) -> Result<(), OutputError> {
        Ok(())
    }
}

/// Discards all events
pub struct NullOutput;

#[async_trait]
impl ReplyOutput for NullOutput {
    async fn emit_event(&self, _event: ReplyEvent) -> Result<(), OutputError> {
        Ok(())
    }
}
