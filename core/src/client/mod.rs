//! Resilient request client
//!
//! Delivers prompts over a session's transport with a single reconnect-and-retry
//! when the connection turns out to be broken at the start of a turn, and collects
//! streamed replies. A reply that breaks off mid-stream is returned as partial text
//! and is never retried.

pub mod outcome;

pub use outcome::{CollectedReply, FailureReason, SendOutcome, TurnOutcome};

use crate::error::{Result, SessionError, TransportError};
use crate::output::{ReplyEvent, ReplyOutput};
use crate::session::{Role, Session, SessionState, TurnStatus};
use crate::transport::{reply_stream, CliConnector, Connector, Fragment, StreamItem};
use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Request client shared by every application surface
#[derive(Clone)]
pub struct ResilientClient {
    connector: Arc<dyn Connector>,
}

impl ResilientClient {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }

    /// Client spawning the agent CLI for each connection
    pub fn cli() -> Self {
        Self::new(Arc::new(CliConnector))
    }

    /// Deliver `prompt`, reconnecting once if the connection is broken.
    ///
    /// Starts a new turn on the session. On failure the session is left
    /// disconnected without a transport.
    pub async fn send(&self, session: &mut Session, prompt: &str) -> SendOutcome {
        session.begin_turn(prompt);

        if !session.has_transport() {
            if let Err(e) = self.acquire(session).await {
                return self.fail(session, FailureReason::Connect(e)).await;
            }
        }

        match self.deliver(session, prompt).await {
            Ok(()) => {
                session.set_state(SessionState::Streaming);
                SendOutcome::Delivered { reconnected: false }
            }
            Err(e) if e.is_connection_broken() => {
                warn!("{}; reconnecting", e);
                session.discard_transport().await;

                if let Err(e) = self.acquire(session).await {
                    return self.fail(session, FailureReason::Reconnect(e)).await;
                }

                match self.deliver(session, prompt).await {
                    Ok(()) => {
                        session.set_state(SessionState::Streaming);
                        SendOutcome::Delivered { reconnected: true }
                    }
                    Err(e) if e.is_connection_broken() => {
                        self.fail(session, FailureReason::RetryExhausted(e)).await
                    }
                    Err(e) => self.fail(session, FailureReason::Other(e)).await,
                }
            }
            Err(e) => self.fail(session, FailureReason::Other(e)).await,
        }
    }

    /// Collect the reply to the prompt just delivered.
    ///
    /// Text fragments are concatenated in arrival order. Outputs that render in
    /// real time receive each one as a delta; the rest only see the full text on
    /// `TurnFinished`. Tool activity goes to `output` only. If the stream ends before
    /// the end of the turn, the partial text is returned with `truncated` set and
    /// the transport is discarded.
    pub async fn stream_collect(
        &self,
        session: &mut Session,
        output: &dyn ReplyOutput,
    ) -> Result<CollectedReply> {
        if session.state() != SessionState::Streaming {
            return Err(SessionError::NotStreaming {
                state: session.state().to_string(),
            }
            .into());
        }

        let transport = session
            .transport_mut()
            .ok_or(SessionError::NotConnected)?;

        let mut text = String::new();
        let mut fragments = Vec::new();
        let mut summary = None;
        let mut error: Option<TransportError> = None;
        let realtime = output.supports_realtime_updates();

        {
            let stream = reply_stream(transport.as_mut());
            futures::pin_mut!(stream);

            while let Some(item) = stream.next().await {
                match item {
                    Ok(StreamItem::Fragment(Fragment::Text { text: delta })) => {
                        text.push_str(&delta);
                        fragments.push(delta.clone());
                        if !realtime {
                            continue;
                        }
                        emit(
                            output,
                            ReplyEvent::TextDelta {
                                delta,
                                accumulated: text.clone(),
                            },
                        )
                        .await;
                    }
                    Ok(StreamItem::Fragment(fragment)) => {
                        debug!("Tool activity: {:?}", fragment);
                        emit(output, ReplyEvent::ToolActivity { fragment }).await;
                    }
                    Ok(StreamItem::EndOfTurn(end)) => summary = Some(end),
                    Err(e) => error = Some(e),
                }
            }
        }

        let truncated = summary.is_none();
        if truncated {
            let reason = error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "reply ended without end of turn".to_string());
            warn!("Reply truncated after {} bytes: {}", text.len(), reason);
            session.finish_turn(fragments, TurnStatus::Truncated);
            session.discard_transport().await;
        } else {
            session.finish_turn(fragments, TurnStatus::Success);
            session.set_state(SessionState::Connected);
        }

        emit(
            output,
            ReplyEvent::TurnFinished {
                text: text.clone(),
                truncated,
                summary: summary.clone(),
            },
        )
        .await;
        if let Err(e) = output.flush().await {
            debug!("Output flush failed: {}", e);
        }

        Ok(CollectedReply {
            text,
            truncated,
            summary,
            error: error.map(|e| e.to_string()),
        })
    }

    /// Run one complete turn: claim the session, send, collect and record.
    pub async fn run_turn(
        &self,
        session: &mut Session,
        prompt: &str,
        output: &dyn ReplyOutput,
    ) -> TurnOutcome {
        let Some(_guard) = session.try_acquire() else {
            debug!("Turn rejected, session {} is busy", session.id());
            return TurnOutcome::Rejected;
        };

        session.transcript_mut().push(Role::User, prompt);

        let reconnected = match self.send(session, prompt).await {
            SendOutcome::Delivered { reconnected } => reconnected,
            SendOutcome::Failed(reason) => return TurnOutcome::NoReply(reason),
        };

        match self.stream_collect(session, output).await {
            Ok(reply) => {
                if !reply.text.is_empty() {
                    session
                        .transcript_mut()
                        .push(Role::Assistant, reply.text.clone());
                }
                TurnOutcome::Replied { reply, reconnected }
            }
            Err(e) => TurnOutcome::NoReply(FailureReason::Other(TransportError::other(
                e.to_string(),
            ))),
        }
    }

    /// Return the session to a fresh, disconnected state
    pub async fn reset(&self, session: &mut Session) {
        session.reset().await;
    }

    async fn acquire(&self, session: &mut Session) -> std::result::Result<(), TransportError> {
        let transport = self.connector.connect(session.options()).await?;
        session.install_transport(transport);
        debug!(
            "Session {} connected (generation {})",
            session.id(),
            session.generation()
        );
        Ok(())
    }

    async fn deliver(
        &self,
        session: &mut Session,
        prompt: &str,
    ) -> std::result::Result<(), TransportError> {
        session.set_state(SessionState::Sending);
        let transport = session
            .transport_mut()
            .ok_or_else(|| TransportError::other("no transport"))?;
        transport.submit(prompt).await
    }

    async fn fail(&self, session: &mut Session, reason: FailureReason) -> SendOutcome {
        warn!("Send failed: {}", reason);
        let status = match reason {
            FailureReason::Other(_) => TurnStatus::UnexpectedFailure,
            _ => TurnStatus::TransportFailure,
        };
        session.finish_turn(Vec::new(), status);
        session.discard_transport().await;
        SendOutcome::Failed(reason)
    }
}

async fn emit(output: &dyn ReplyOutput, event: ReplyEvent) {
    if let Err(e) = output.emit_event(event).await {
        debug!("Output handler failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentOptions;
    use crate::output::NullOutput;
    use crate::transport::{Transport, TransportResult, TurnSummary};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// What one fake connection does
    #[derive(Default)]
    struct Script {
        submits: VecDeque<TransportResult<()>>,
        items: VecDeque<TransportResult<StreamItem>>,
    }

    impl Script {
        fn submit(mut self, result: TransportResult<()>) -> Self {
            self.submits.push_back(result);
            self
        }

        fn reply(mut self, texts: &[&str]) -> Self {
            for text in texts {
                self.items
                    .push_back(Ok(StreamItem::Fragment(Fragment::text(*text))));
            }
            self.items
                .push_back(Ok(StreamItem::EndOfTurn(TurnSummary::default())));
            self
        }

        fn item(mut self, item: TransportResult<StreamItem>) -> Self {
            self.items.push_back(item);
            self
        }
    }

    struct FakeTransport {
        script: Script,
        submitted: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn submit(&mut self, _prompt: &str) -> TransportResult<()> {
            self.submitted.fetch_add(1, Ordering::SeqCst);
            self.script.submits.pop_front().unwrap_or(Ok(()))
        }

        async fn next_fragment(&mut self) -> TransportResult<StreamItem> {
            self.script
                .items
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::stream("script exhausted")))
        }

        async fn disconnect(&mut self) -> TransportResult<()> {
            Err(TransportError::other("already gone"))
        }
    }

    #[derive(Default)]
    struct FakeConnector {
        connects: AtomicUsize,
        submitted: Arc<AtomicUsize>,
        scripts: Mutex<VecDeque<TransportResult<Script>>>,
    }

    impl FakeConnector {
        fn with(scripts: Vec<TransportResult<Script>>) -> Arc<Self> {
            Arc::new(Self {
                scripts: Mutex::new(scripts.into()),
                ..Default::default()
            })
        }

        fn connects(&self) -> usize {
            self.connects.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Connector for FakeConnector {
        async fn connect(
            &self,
            _options: &AgentOptions,
        ) -> TransportResult<Box<dyn Transport>> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            let script = self
                .scripts
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Script::default()))?;
            Ok(Box::new(FakeTransport {
                script,
                submitted: Arc::clone(&self.submitted),
            }))
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<ReplyEvent>>);

    #[async_trait]
    impl ReplyOutput for Recorder {
        async fn emit_event(&self, event: ReplyEvent) -> std::result::Result<(), crate::output::OutputError> {
            self.0.lock().unwrap().push(event);
            Ok(())
        }
    }

    /// Records events but renders only finished replies
    #[derive(Default)]
    struct BufferedRecorder(Recorder);

    #[async_trait]
    impl ReplyOutput for BufferedRecorder {
        async fn emit_event(&self, event: ReplyEvent) -> std::result::Result<(), crate::output::OutputError> {
            self.0.emit_event(event).await
        }

        fn supports_realtime_updates(&self) -> bool {
            false
        }
    }

    fn broken() -> TransportError {
        TransportError::connection_broken("broken pipe")
    }

    fn setup(scripts: Vec<TransportResult<Script>>) -> (Arc<FakeConnector>, ResilientClient, Session) {
        let connector = FakeConnector::with(scripts);
        let client = ResilientClient::new(connector.clone());
        (connector, client, Session::new(AgentOptions::new()))
    }

    #[tokio::test]
    async fn test_send_connects_lazily() {
        let (connector, client, mut session) = setup(vec![Ok(Script::default())]);
        assert_eq!(connector.connects(), 0);

        let outcome = client.send(&mut session, "hi").await;
        assert_eq!(outcome, SendOutcome::Delivered { reconnected: false });
        assert_eq!(connector.connects(), 1);
        assert_eq!(session.state(), SessionState::Streaming);
        assert_eq!(session.generation(), 1);
    }

    #[tokio::test]
    async fn test_initial_connect_failure_is_not_retried() {
        let (connector, client, mut session) =
            setup(vec![Err(TransportError::CliNotFound { searched: "claude".into() })]);

        let outcome = client.send(&mut session, "hi").await;
        assert!(matches!(outcome, SendOutcome::Failed(FailureReason::Connect(_))));
        assert_eq!(connector.connects(), 1);
        assert_eq!(session.state(), SessionState::Disconnected);
        assert_eq!(
            session.current_turn().unwrap().status,
            TurnStatus::TransportFailure
        );
    }

    #[tokio::test]
    async fn test_broken_twice_fails() {
        let (connector, client, mut session) = setup(vec![
            Ok(Script::default().submit(Err(broken()))),
            Ok(Script::default().submit(Err(broken()))),
        ]);

        let outcome = client.send(&mut session, "hi").await;
        assert!(matches!(
            outcome,
            SendOutcome::Failed(FailureReason::RetryExhausted(_))
        ));
        assert_eq!(connector.connects(), 2);
        assert_eq!(connector.submitted.load(Ordering::SeqCst), 2);
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[tokio::test]
    async fn test_broken_then_ok_reconnects() {
        let (connector, client, mut session) = setup(vec![
            Ok(Script::default().submit(Err(broken()))),
            Ok(Script::default().reply(&["fine"])),
        ]);

        let outcome = client.send(&mut session, "hi").await;
        assert_eq!(outcome, SendOutcome::Delivered { reconnected: true });
        assert_eq!(connector.connects(), 2);
        assert_eq!(session.generation(), 2);

        let reply = client.stream_collect(&mut session, &NullOutput).await.unwrap();
        assert_eq!(reply.text, "fine");
    }

    #[tokio::test]
    async fn test_reconnect_failure_fails() {
        let (connector, client, mut session) = setup(vec![
            Ok(Script::default().submit(Err(broken()))),
            Err(TransportError::Connect { message: "spawn failed".into() }),
        ]);

        let outcome = client.send(&mut session, "hi").await;
        assert!(matches!(outcome, SendOutcome::Failed(FailureReason::Reconnect(_))));
        assert_eq!(connector.connects(), 2);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let (connector, client, mut session) = setup(vec![Ok(
            Script::default().submit(Err(TransportError::other("bad request")))
        )]);

        let outcome = client.send(&mut session, "hi").await;
        assert!(matches!(outcome, SendOutcome::Failed(FailureReason::Other(_))));
        assert_eq!(connector.connects(), 1);
        assert_eq!(
            session.current_turn().unwrap().status,
            TurnStatus::UnexpectedFailure
        );
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[tokio::test]
    async fn test_collect_preserves_fragment_order() {
        let (_, client, mut session) =
            setup(vec![Ok(Script::default().reply(&["Hel", "lo, ", "world"]))]);
        let recorder = Recorder::default();

        client.send(&mut session, "greet").await;
        let reply = client.stream_collect(&mut session, &recorder).await.unwrap();

        assert_eq!(reply.text, "Hello, world");
        assert!(!reply.truncated);
        assert!(reply.summary.is_some());
        assert_eq!(session.state(), SessionState::Connected);

        let turn = session.current_turn().unwrap();
        assert_eq!(turn.fragments, vec!["Hel", "lo, ", "world"]);
        assert_eq!(turn.status, TurnStatus::Success);

        let events = recorder.0.lock().unwrap();
        assert_eq!(
            events[1],
            ReplyEvent::TextDelta {
                delta: "lo, ".into(),
                accumulated: "Hello, ".into()
            }
        );
        assert!(matches!(
            events.last(),
            Some(ReplyEvent::TurnFinished { truncated: false, .. })
        ));
    }

    #[tokio::test]
    async fn test_collect_without_realtime_sends_only_finished_text() {
        let (_, client, mut session) =
            setup(vec![Ok(Script::default().reply(&["Hel", "lo"]))]);
        let buffered = BufferedRecorder::default();

        client.send(&mut session, "greet").await;
        let reply = client.stream_collect(&mut session, &buffered).await.unwrap();

        assert_eq!(reply.text, "Hello");
        assert_eq!(
            session.current_turn().unwrap().fragments,
            vec!["Hel", "lo"]
        );
        let events = (buffered.0).0.lock().unwrap();
        assert!(!events
            .iter()
            .any(|e| matches!(e, ReplyEvent::TextDelta { .. })));
        assert!(matches!(
            events.last(),
            Some(ReplyEvent::TurnFinished { text, truncated: false, .. }) if text == "Hello"
        ));
    }

    #[tokio::test]
    async fn test_collect_excludes_tool_fragments() {
        let invocation = Fragment::ToolInvocation {
            id: "toolu_1".into(),
            name: "mcp__utils__now".into(),
            input: json!({}),
        };
        let (_, client, mut session) = setup(vec![Ok(Script::default()
            .item(Ok(StreamItem::Fragment(invocation.clone())))
            .reply(&["ok"]))]);
        let recorder = Recorder::default();

        client.send(&mut session, "time?").await;
        let reply = client.stream_collect(&mut session, &recorder).await.unwrap();

        assert_eq!(reply.text, "ok");
        let events = recorder.0.lock().unwrap();
        let notices: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, ReplyEvent::ToolActivity { .. }))
            .collect();
        assert_eq!(notices, vec![&ReplyEvent::ToolActivity { fragment: invocation }]);
    }

    #[tokio::test]
    async fn test_mid_stream_error_returns_partial_text() {
        let (connector, client, mut session) = setup(vec![Ok(Script::default()
            .item(Ok(StreamItem::Fragment(Fragment::text("partial"))))
            .item(Err(TransportError::stream("eof"))))]);

        client.send(&mut session, "long answer").await;
        let reply = client.stream_collect(&mut session, &NullOutput).await.unwrap();

        assert_eq!(reply.text, "partial");
        assert!(reply.truncated);
        assert!(reply.summary.is_none());
        assert_eq!(reply.error.as_deref(), Some("Stream ended abnormally: eof"));
        assert_eq!(connector.connects(), 1);
        assert_eq!(session.state(), SessionState::Disconnected);
        assert_eq!(session.current_turn().unwrap().status, TurnStatus::Truncated);

        // The next turn starts from a fresh connection
        client.send(&mut session, "again").await;
        assert_eq!(connector.connects(), 2);
    }

    #[tokio::test]
    async fn test_collect_requires_streaming_state() {
        let (connector, client, mut session) = setup(vec![]);
        let err = client
            .stream_collect(&mut session, &NullOutput)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("disconnected"));
        assert_eq!(connector.connects(), 0);
    }

    #[tokio::test]
    async fn test_reset_mid_stream_forces_new_connection() {
        let (connector, client, mut session) = setup(vec![
            Ok(Script::default().reply(&["unused"])),
            Ok(Script::default().reply(&["fresh"])),
        ]);

        client.send(&mut session, "first").await;
        assert_eq!(session.state(), SessionState::Streaming);

        client.reset(&mut session).await;
        assert_eq!(session.state(), SessionState::Disconnected);

        client.send(&mut session, "second").await;
        assert_eq!(connector.connects(), 2);
        let reply = client.stream_collect(&mut session, &NullOutput).await.unwrap();
        assert_eq!(reply.text, "fresh");
        assert_eq!(session.turn_counter(), 2);
    }

    #[tokio::test]
    async fn test_run_turn_while_busy_is_rejected() {
        let (connector, client, mut session) = setup(vec![Ok(Script::default().reply(&["x"]))]);

        let guard = session.try_acquire();
        assert!(guard.is_some());
        let outcome = client.run_turn(&mut session, "hi", &NullOutput).await;
        assert_eq!(outcome, TurnOutcome::Rejected);
        assert_eq!(connector.connects(), 0);
        assert!(session.transcript().is_empty());

        drop(guard);
        let outcome = client.run_turn(&mut session, "hi", &NullOutput).await;
        assert!(matches!(outcome, TurnOutcome::Replied { .. }));
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_run_turn_records_transcript() {
        let (_, client, mut session) = setup(vec![Ok(Script::default()
            .reply(&["4"])
            .reply(&["8"]))]);

        client.run_turn(&mut session, "2+2?", &NullOutput).await;
        client.run_turn(&mut session, "4+4?", &NullOutput).await;

        let texts: Vec<(Role, &str)> = session
            .transcript()
            .entries()
            .iter()
            .map(|e| (e.role, e.text.as_str()))
            .collect();
        assert_eq!(
            texts,
            vec![
                (Role::User, "2+2?"),
                (Role::Assistant, "4"),
                (Role::User, "4+4?"),
                (Role::Assistant, "8"),
            ]
        );
        assert_eq!(session.generation(), 1);
    }

    #[tokio::test]
    async fn test_run_turn_without_reply() {
        let (_, client, mut session) =
            setup(vec![Err(TransportError::Connect { message: "nope".into() })]);

        let outcome = client.run_turn(&mut session, "hi", &NullOutput).await;
        assert!(matches!(outcome, TurnOutcome::NoReply(FailureReason::Connect(_))));
        assert_eq!(session.transcript().len(), 1);
    }
}
