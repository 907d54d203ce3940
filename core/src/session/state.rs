//! Session and turn states

use serde::{Deserialize, Serialize};
use std::fmt;

/// Connection state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No live transport; the next send connects lazily
    Disconnected,
    /// Transport is up and idle
    Connected,
    /// A prompt is being delivered
    Sending,
    /// The prompt was delivered and the reply is pending
    Streaming,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connected => "connected",
            SessionState::Sending => "sending",
            SessionState::Streaming => "streaming",
        };
        f.write_str(name)
    }
}

/// Terminal status of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnStatus {
    InFlight,
    Success,
    /// The reply stream ended before the end of the turn
    Truncated,
    /// The prompt could not be delivered
    TransportFailure,
    /// A non-retryable error occurred
    UnexpectedFailure,
}
