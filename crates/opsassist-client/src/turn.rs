use std::sync::{Arc, Mutex};

use futures::StreamExt as _;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::debug;

use crate::assistant::AssistantInner;
use crate::errors::{AssistantError, TurnFailure, turn_failure_from_transport_error};
use crate::event::AgentEvent;
use crate::request::{ChatMessage, Strategy, TurnOptions, TurnRequest};
use crate::snapshot::TurnSnapshot;
use crate::sse::Payload;
use crate::stream::TurnEvent;
use crate::transport::AgentTransport;

/// Handle used to request cancellation of a running turn.
#[derive(Clone)]
pub struct AbortHandle {
    tx: watch::Sender<bool>,
}

impl AbortHandle {
    /// Requests cancellation.
    ///
    /// Cancellation is cooperative and becomes visible as a terminal
    /// `TurnEvent::Error` carrying `TurnFailure::Cancelled` — never as a
    /// generic failure.
    pub fn abort(&self) {
        let _ = self.tx.send(true);
    }
}

/// Builder for configuring and starting a single streamed turn.
pub struct TurnBuilder {
    assistant: Arc<AssistantInner>,
    in_flight: Arc<Mutex<Option<AbortHandle>>>,
    _conversation_name: String,
    request: TurnRequest,
    options: TurnOptions,
}

impl TurnBuilder {
    pub(crate) fn new(
        assistant: Arc<AssistantInner>,
        in_flight: Arc<Mutex<Option<AbortHandle>>>,
        conversation_name: String,
        session_id: Option<uuid::Uuid>,
        query: String,
    ) -> Self {
        let mut request = TurnRequest::new(query);
        request.session_id = session_id;
        Self {
            assistant,
            in_flight,
            _conversation_name: conversation_name,
            request,
            options: TurnOptions::default(),
        }
    }

    /// Sets the retrieval strategy for the turn.
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.request.strategy = strategy;
        self
    }

    /// Sets the maximum number of context chunks retrieved (`1..=20`).
    pub fn max_chunks(mut self, max_chunks: u8) -> Self {
        self.request.max_chunks = max_chunks;
        self
    }

    /// Sets the similarity score threshold (`0.0..=1.0`).
    pub fn score_threshold(mut self, score_threshold: f64) -> Self {
        self.request.score_threshold = score_threshold;
        self
    }

    /// Overrides the tenant's default LLM provider for this turn.
    pub fn llm_provider(mut self, provider: impl Into<String>) -> Self {
        self.request.llm_provider = Some(provider.into());
        self
    }

    /// Overrides the tenant's default LLM model for this turn.
    pub fn llm_model(mut self, model: impl Into<String>) -> Self {
        self.request.llm_model = Some(model.into());
        self
    }

    /// Supplies extra conversation history beyond what the backend session
    /// already holds.
    pub fn history(mut self, messages: Vec<ChatMessage>) -> Self {
        self.request.conversation = Some(messages);
        self
    }

    /// Sets an optional per-turn timeout.
    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    /// Sets the bounded stream buffer size used between the runtime task and
    /// the consumer.
    pub fn stream_buffer_capacity(mut self, capacity: usize) -> Self {
        self.options.stream_buffer_capacity = capacity;
        self
    }

    /// Validates the builder state and starts the streaming turn.
    ///
    /// Starting a turn aborts any turn previously started from the same
    /// conversation (last writer wins); the new stream owns its own snapshot.
    pub async fn start_stream(self) -> Result<TurnStream, AssistantError> {
        let validated = self.validate()?;
        let transport = validated.assistant.transport();

        let (tx, rx) = mpsc::channel(validated.options.stream_buffer_capacity);
        let (final_tx, final_rx) = oneshot::channel();
        let (abort_tx, abort_rx) = watch::channel(false);
        let abort_handle = AbortHandle { tx: abort_tx };

        if let Ok(mut slot) = validated.in_flight.lock()
            && let Some(previous) = slot.replace(abort_handle.clone())
        {
            previous.abort();
        }

        let turn_id = uuid::Uuid::new_v4();
        let session_id = validated.request.session_id;
        tokio::spawn(turn_task(
            transport,
            turn_id,
            validated.request,
            validated.options,
            tx,
            final_tx,
            abort_rx,
        ));

        Ok(TurnStream {
            turn_id,
            session_id,
            rx,
            final_rx,
            abort_handle,
            saw_terminal: false,
        })
    }

    /// Runs the turn to completion and returns the final snapshot.
    pub async fn collect_snapshot(self) -> Result<TurnSnapshot, AssistantError> {
        let stream = self.start_stream().await?;
        stream.finish().await
    }

    /// Runs the turn to completion and returns the answer text.
    pub async fn collect_answer(self) -> Result<String, AssistantError> {
        Ok(self.collect_snapshot().await?.answer)
    }

    fn validate(self) -> Result<ValidatedTurn, AssistantError> {
        if self.request.query.trim().is_empty() {
            return Err(AssistantError::Validation(
                "query must not be empty".into(),
            ));
        }
        if !(1..=20).contains(&self.request.max_chunks) {
            return Err(AssistantError::Validation(
                "max_chunks must be between 1 and 20".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.request.score_threshold) {
            return Err(AssistantError::Validation(
                "score_threshold must be within [0, 1]".into(),
            ));
        }
        if self.options.stream_buffer_capacity == 0 {
            return Err(AssistantError::Validation(
                "stream_buffer_capacity must be greater than 0".into(),
            ));
        }
        if let Some(messages) = self.request.conversation.as_deref() {
            for message in messages {
                if message.role.trim().is_empty() || message.content.trim().is_empty() {
                    return Err(AssistantError::Validation(
                        "history messages must have a role and content".into(),
                    ));
                }
            }
        }
        Ok(ValidatedTurn {
            assistant: self.assistant,
            in_flight: self.in_flight,
            request: self.request,
            options: self.options,
        })
    }
}

struct ValidatedTurn {
    assistant: Arc<AssistantInner>,
    in_flight: Arc<Mutex<Option<AbortHandle>>>,
    request: TurnRequest,
    options: TurnOptions,
}

/// Streaming handle returned by `TurnBuilder::start_stream`.
///
/// Use `next_event()` to consume events as they arrive and `finish()` to
/// obtain the final snapshot after the terminal event.
pub struct TurnStream {
    turn_id: uuid::Uuid,
    session_id: Option<uuid::Uuid>,
    rx: mpsc::Receiver<TurnEvent>,
    final_rx: oneshot::Receiver<Result<TurnSnapshot, AssistantError>>,
    abort_handle: AbortHandle,
    saw_terminal: bool,
}

impl TurnStream {
    /// Returns the client-side id for this turn.
    pub fn turn_id(&self) -> uuid::Uuid {
        self.turn_id
    }

    /// Returns the backend session this turn was addressed to, if any was
    /// requested. The backend creates one otherwise and reports it through a
    /// `status` event (see `TurnSnapshot::session_id`).
    pub fn session_id(&self) -> Option<uuid::Uuid> {
        self.session_id
    }

    /// Returns a handle that can cancel the turn.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort_handle.clone()
    }

    /// Waits for and returns the next normalized event.
    ///
    /// Returns `None` after the stream channel is closed.
    pub async fn next_event(&mut self) -> Option<TurnEvent> {
        let event = self.rx.recv().await;
        if let Some(TurnEvent::Completed { .. } | TurnEvent::Error { .. }) = &event {
            self.saw_terminal = true;
        }
        event
    }

    /// Drains the stream (if needed) and returns the terminal snapshot.
    ///
    /// Safe to call after consuming events manually with `next_event()`.
    pub async fn finish(mut self) -> Result<TurnSnapshot, AssistantError> {
        while !self.saw_terminal {
            match self.rx.recv().await {
                Some(TurnEvent::Completed { .. } | TurnEvent::Error { .. }) => {
                    self.saw_terminal = true;
                }
                Some(_) => {}
                None => break,
            }
        }

        match self.final_rx.await {
            Ok(result) => result,
            Err(_) => Err(AssistantError::protocol_msg(format!(
                "turn task ended without final result (turn_id={})",
                self.turn_id
            ))),
        }
    }
}

async fn turn_task(
    transport: Arc<dyn AgentTransport>,
    turn_id: uuid::Uuid,
    request: TurnRequest,
    options: TurnOptions,
    tx: mpsc::Sender<TurnEvent>,
    final_tx: oneshot::Sender<Result<TurnSnapshot, AssistantError>>,
    mut abort_rx: watch::Receiver<bool>,
) {
    if !send_event(&tx, TurnEvent::TurnStarted { turn_id }).await {
        let _ = final_tx.send(Err(AssistantError::protocol_msg(
            "turn stream receiver dropped before TurnStarted",
        )));
        return;
    }

    // The response body reader lives inside this handle; every return from
    // this function drops it, releasing the connection on all exit paths.
    let mut handle = match transport.open(request, options).await {
        Ok(handle) => handle,
        Err(err) => {
            let failure = turn_failure_from_transport_error(&err);
            let _ = send_event(
                &tx,
                TurnEvent::Error {
                    turn_id,
                    error: failure.clone(),
                },
            )
            .await;
            let _ = final_tx.send(Err(AssistantError::turn_failed(failure)));
            return;
        }
    };

    let mut seq = 0_u64;
    let mut snapshot = TurnSnapshot::new();
    // Cleared once every abort handle is gone; `changed()` on a closed
    // channel resolves immediately, so the arm must stop being polled.
    let mut abort_open = true;
    loop {
        tokio::select! {
            changed = abort_rx.changed(), if abort_open => {
                match changed {
                    Ok(_) if *abort_rx.borrow() => {
                        let failure = TurnFailure::Cancelled;
                        let _ = send_event(&tx, TurnEvent::Error { turn_id, error: failure.clone() }).await;
                        let _ = final_tx.send(Err(AssistantError::turn_failed(failure)));
                        return;
                    }
                    Ok(_) => {}
                    Err(_) => abort_open = false,
                }
            }
            next = handle.payloads.next() => {
                match next {
                    Some(Ok(Payload::Content(payload))) => {
                        match AgentEvent::decode(&payload) {
                            Ok(event) => snapshot.apply(event),
                            Err(err) => {
                                // fail-open: one bad frame never aborts a healthy stream
                                debug!(turn_id = %turn_id, seq, error = %err, "dropping undecodable payload");
                            }
                        }
                        let sent = send_event(&tx, TurnEvent::Message { turn_id, seq, payload }).await;
                        seq = seq.saturating_add(1);
                        if !sent {
                            let _ = final_tx.send(Err(AssistantError::protocol_msg("turn stream receiver dropped during delivery")));
                            return;
                        }
                    }
                    Some(Ok(Payload::Done)) | None => {
                        // [DONE] sentinel and end-of-body both finalize the turn
                        debug!(turn_id = %turn_id, seq, status = ?snapshot.status, "agent stream finished");
                        let sent = send_event(&tx, TurnEvent::Completed { turn_id, snapshot: snapshot.clone() }).await;
                        let _ = final_tx.send(if sent {
                            Ok(snapshot)
                        } else {
                            Err(AssistantError::protocol_msg("turn stream receiver dropped before completion"))
                        });
                        return;
                    }
                    Some(Ok(Payload::Error)) => {
                        let failure = TurnFailure::Upstream {
                            message: "agent stream reported a failure".to_string(),
                            status_code: None,
                        };
                        let _ = send_event(&tx, TurnEvent::Error { turn_id, error: failure.clone() }).await;
                        let _ = final_tx.send(Err(AssistantError::turn_failed(failure)));
                        return;
                    }
                    Some(Ok(Payload::Empty)) => {}
                    Some(Err(err)) => {
                        let failure = turn_failure_from_transport_error(&err);
                        let _ = send_event(&tx, TurnEvent::Error { turn_id, error: failure.clone() }).await;
                        let _ = final_tx.send(Err(AssistantError::turn_failed(failure)));
                        return;
                    }
                }
            }
        }
    }
}

async fn send_event(tx: &mpsc::Sender<TurnEvent>, event: TurnEvent) -> bool {
    tx.send(event).await.is_ok()
}
