//! Outcomes reported by the resilient client

use crate::error::TransportError;
use crate::transport::TurnSummary;
use thiserror::Error;

/// Why a prompt could not be delivered
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The first connection attempt failed
    #[error("could not connect: {0}")]
    Connect(TransportError),

    /// The connection broke and reconnecting failed
    #[error("reconnect failed: {0}")]
    Reconnect(TransportError),

    /// The connection broke again after reconnecting
    #[error("connection lost twice: {0}")]
    RetryExhausted(TransportError),

    /// A non-retryable error
    #[error("{0}")]
    Other(TransportError),
}

impl FailureReason {
    pub fn error(&self) -> &TransportError {
        match self {
            FailureReason::Connect(e)
            | FailureReason::Reconnect(e)
            | FailureReason::RetryExhausted(e)
            | FailureReason::Other(e) => e,
        }
    }
}

/// Result of delivering a prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered { reconnected: bool },
    Failed(FailureReason),
}

/// Text collected from one reply
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectedReply {
    pub text: String,
    /// The stream ended before the end of the turn
    pub truncated: bool,
    /// End-of-turn metadata, absent when truncated
    pub summary: Option<TurnSummary>,
    /// What ended a truncated stream
    pub error: Option<String>,
}

/// Result of a complete turn
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// Another turn is in flight
    Rejected,
    /// The prompt never reached the agent
    NoReply(FailureReason),
    /// A reply was collected, possibly truncated
    Replied {
        reply: CollectedReply,
        reconnected: bool,
    },
}
