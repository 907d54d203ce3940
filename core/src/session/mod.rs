//! Conversation sessions
//!
//! A [`Session`] exclusively owns at most one live [`Transport`]. The transport is
//! never patched in place: reconnecting installs a new one and bumps the
//! generation counter, so callers can observe that the handle was replaced.

pub mod busy;
pub mod state;
pub mod transcript;

pub use busy::{BusyFlag, BusyGuard};
pub use state::{SessionState, TurnStatus};
pub use transcript::{Role, Transcript, TranscriptEntry};

use crate::config::AgentOptions;
use crate::transport::Transport;
use tracing::debug;
use uuid::Uuid;

/// One request/response exchange
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub number: u64,
    pub prompt: String,
    /// Text fragments in arrival order
    pub fragments: Vec<String>,
    pub status: TurnStatus,
}

impl Turn {
    fn new(number: u64, prompt: &str) -> Self {
        Self {
            number,
            prompt: prompt.to_string(),
            fragments: Vec::new(),
            status: TurnStatus::InFlight,
        }
    }

    /// Accumulated reply text
    pub fn text(&self) -> String {
        self.fragments.concat()
    }
}

/// A conversation bound to one set of agent options
pub struct Session {
    id: Uuid,
    options: AgentOptions,
    transport: Option<Box<dyn Transport>>,
    state: SessionState,
    turn_counter: u64,
    generation: u64,
    busy: BusyFlag,
    current_turn: Option<Turn>,
    transcript: Transcript,
}

impl Session {
    /// Create a disconnected session; the transport is acquired on first send
    pub fn new(options: AgentOptions) -> Self {
        Self {
            id: Uuid::new_v4(),
            options,
            transport: None,
            state: SessionState::Disconnected,
            turn_counter: 0,
            generation: 0,
            busy: BusyFlag::new(),
            current_turn: None,
            transcript: Transcript::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn options(&self) -> &AgentOptions {
        &self.options
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Number of transports acquired so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn turn_counter(&self) -> u64 {
        self.turn_counter
    }

    pub fn current_turn(&self) -> Option<&Turn> {
        self.current_turn.as_ref()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// Claim the session for one turn
    pub fn try_acquire(&self) -> Option<BusyGuard> {
        self.busy.try_acquire()
    }

    /// Drop the transport and forget the current turn and transcript.
    ///
    /// The turn counter keeps increasing across resets.
    pub async fn reset(&mut self) {
        self.discard_transport().await;
        self.current_turn = None;
        self.transcript.clear();
        debug!("Session {} reset", self.id);
    }

    pub(crate) fn has_transport(&self) -> bool {
        self.transport.is_some()
    }

    pub(crate) fn install_transport(&mut self, transport: Box<dyn Transport>) {
        self.transport = Some(transport);
        self.generation += 1;
        self.state = SessionState::Connected;
    }

    pub(crate) fn transport_mut(&mut self) -> Option<&mut Box<dyn Transport>> {
        self.transport.as_mut()
    }

    /// Best-effort disconnect, then drop the transport
    pub(crate) async fn discard_transport(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            if let Err(e) = transport.disconnect().await {
                debug!("Ignoring disconnect error: {}", e);
            }
        }
        self.state = SessionState::Disconnected;
    }

    pub(crate) fn set_state(&mut self, state: SessionState) {
        self.state = state;
    }

    pub(crate) fn begin_turn(&mut self, prompt: &str) -> u64 {
        self.turn_counter += 1;
        self.current_turn = Some(Turn::new(self.turn_counter, prompt));
        self.turn_counter
    }

    pub(crate) fn finish_turn(&mut self, fragments: Vec<String>, status: TurnStatus) {
        if let Some(turn) = self.current_turn.as_mut() {
            turn.fragments.extend(fragments);
            turn.status = status;
        }
    }

    pub(crate) fn transcript_mut(&mut self) -> &mut Transcript {
        &mut self.transcript
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("turn_counter", &self.turn_counter)
            .field("generation", &self.generation)
            .field("busy", &self.busy.is_busy())
            .field("transcript_len", &self.transcript.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_disconnected() {
        let session = Session::new(AgentOptions::new());
        assert_eq!(session.state(), SessionState::Disconnected);
        assert_eq!(session.generation(), 0);
        assert!(session.current_turn().is_none());
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_reset_keeps_turn_counter() {
        let mut session = Session::new(AgentOptions::new());
        session.begin_turn("one");
        session.transcript_mut().push(Role::User, "one");
        session.finish_turn(vec!["a".into(), "b".into()], TurnStatus::Success);
        assert_eq!(session.current_turn().unwrap().text(), "ab");

        session.reset().await;
        assert!(session.current_turn().is_none());
        assert!(session.transcript().is_empty());
        assert_eq!(session.begin_turn("two"), 2);
    }
}
