use super::config::SessionConfig;
use super::fanout::{CaptionWriter, ResultFanOut};
use super::id::SessionId;
use super::state::{SessionState, SessionStateFlag};
use super::stats::{SessionCounters, SessionStats, StopReason};
use crate::audio::{validate_frame, AudioFrame, AudioIngressQueue};
use crate::error::{QueueError, SessionError};
use crate::protocol::{ClientCommand, ClientEvent, ServerMessage};
use crate::recognizer::{AdapterExit, DuplexAdapter, OutboundContext, Recognizer};
use crate::sink::CaptionSink;
use chrono::{DateTime, Utc};
use futures::stream::{Stream, StreamExt};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Transport-facing half of the session: validates frames and feeds the
/// ingress queue
struct Ingress {
    queue: Arc<AudioIngressQueue>,
    state: SessionStateFlag,
    counters: Arc<SessionCounters>,
    sequence: AtomicU64,
    max_frame_bytes: usize,
}

impl Ingress {
    /// Queue one transport message of audio
    ///
    /// Waits for space while the queue is full; frames are never dropped
    /// while the session is streaming.
    async fn push(&self, data: Vec<u8>) -> Result<u64, SessionError> {
        if let Err(e) = validate_frame(&data, self.max_frame_bytes) {
            SessionCounters::incr(&self.counters.frames_rejected);
            return Err(e.into());
        }

        if !self.state.keep_streaming() {
            return Err(QueueError::Closed.into());
        }

        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        let mut frame = AudioFrame::new(data, sequence);
        let mut waits = 0u32;

        loop {
            match self.queue.enqueue(frame).await {
                Ok(()) => {
                    SessionCounters::incr(&self.counters.frames_received);
                    if waits > 0 {
                        debug!(sequence, waits, "Ingress backpressure released");
                    }
                    return Ok(sequence);
                }
                Err(QueueError::Full(returned)) => {
                    if !self.state.keep_streaming() {
                        return Err(QueueError::Closed.into());
                    }
                    if waits == 0 {
                        warn!(
                            sequence,
                            capacity = self.queue.capacity(),
                            "Ingress queue full, holding transport reader"
                        );
                    }
                    waits += 1;
                    frame = returned;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Lifecycle controller for one transcription session
///
/// Owns the ingress queue, the duplex adapter and the caption writer, and
/// tears all of them down on every path out of `Streaming`. At most one
/// adapter exists at a time; a new one can only start once the previous
/// run reached `Closed`.
pub struct TranscriptionSession {
    session_id: SessionId,
    config: SessionConfig,
    recognizer: Arc<dyn Recognizer>,
    sink: Arc<dyn CaptionSink>,
    client: mpsc::UnboundedSender<ServerMessage>,
    state: SessionStateFlag,
    counters: Arc<SessionCounters>,
    ingress: Ingress,
    adapter: Option<DuplexAdapter>,
    caption_writer: Option<CaptionWriter>,
    started_at: Option<DateTime<Utc>>,
    stop_reason: Option<StopReason>,
}

impl TranscriptionSession {
    /// Create an idle session; recognizer and sink are process-scoped and
    /// shared
    pub fn new(
        session_id: SessionId,
        config: SessionConfig,
        recognizer: Arc<dyn Recognizer>,
        sink: Arc<dyn CaptionSink>,
        client: mpsc::UnboundedSender<ServerMessage>,
    ) -> Self {
        let state = SessionStateFlag::new();
        let counters = Arc::new(SessionCounters::default());

        let ingress = Ingress {
            queue: Arc::new(AudioIngressQueue::new(
                config.queue_capacity,
                config.enqueue_timeout,
            )),
            state: state.clone(),
            counters: Arc::clone(&counters),
            sequence: AtomicU64::new(0),
            max_frame_bytes: config.max_frame_bytes,
        };

        Self {
            session_id,
            config,
            recognizer,
            sink,
            client,
            state,
            counters,
            ingress,
            adapter: None,
            caption_writer: None,
            started_at: None,
            stop_reason: None,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    /// Read-only view of the lifecycle flag
    pub fn state_flag(&self) -> SessionStateFlag {
        self.state.clone()
    }

    /// Open a recognition call and start streaming
    ///
    /// Allowed from `Idle`, or from `Closed` to run a fresh adapter after a
    /// previous one finished.
    pub async fn start(&mut self) -> Result<(), SessionError> {
        let current = self.state.get();
        if !matches!(current, SessionState::Idle | SessionState::Closed) {
            return Err(SessionError::InvalidState {
                session_id: self.session_id.to_string(),
                state: current.to_string(),
            });
        }

        info!(
            session_id = %self.session_id,
            recognizer = self.recognizer.name(),
            "Starting transcription session"
        );

        self.state.set(SessionState::Starting);
        self.started_at = Some(Utc::now());
        self.stop_reason = None;

        if self.ingress.queue.is_closed() {
            self.ingress.queue = Arc::new(AudioIngressQueue::new(
                self.config.queue_capacity,
                self.config.enqueue_timeout,
            ));
        }

        let call = match self.recognizer.open(self.session_id.as_str()).await {
            Ok(call) => call,
            Err(e) => {
                error!(session_id = %self.session_id, "Failed to open recognition call: {}", e);
                self.ingress.queue.close().await;
                self.state.set(SessionState::Closed);
                self.stop_reason = Some(StopReason::StreamFailed(e.to_string()));
                return Err(e.into());
            }
        };

        let (fanout, writer) = ResultFanOut::spawn(
            self.session_id.as_str(),
            self.client.clone(),
            Arc::clone(&self.sink),
            Arc::clone(&self.counters),
        );

        let ctx = OutboundContext {
            session_id: self.session_id.to_string(),
            config: self.config.recognizer.clone(),
            queue: Arc::clone(&self.ingress.queue),
            state: self.state.clone(),
            counters: Arc::clone(&self.counters),
            dequeue_poll: self.config.dequeue_poll,
            send_timeout: self.config.send_timeout,
        };

        self.adapter = Some(DuplexAdapter::spawn(call, ctx, fanout));
        self.caption_writer = Some(writer);

        // No acknowledgement from the recognizer is awaited
        self.state.set(SessionState::Streaming);

        info!(session_id = %self.session_id, "Session streaming");

        Ok(())
    }

    /// Accept one frame of audio from the transport
    ///
    /// Returns the frame's sequence number. Malformed frames are rejected
    /// without affecting the session.
    pub async fn push_audio(&self, data: Vec<u8>) -> Result<u64, SessionError> {
        self.ingress.push(data).await
    }

    /// Run the session against a stream of transport events until the
    /// client stops, the transport disconnects, or the recognizer fails
    ///
    /// The stop sequence always runs before this returns.
    pub async fn run<S>(&mut self, mut events: S) -> SessionStats
    where
        S: Stream<Item = ClientEvent> + Unpin,
    {
        if let Err(e) = self.start().await {
            let _ = self.client.send(ServerMessage::error(e.to_string()));
            return self.stats();
        }

        let reason = loop {
            tokio::select! {
                exit = adapter_exit(&mut self.adapter) => break exit_reason(exit),
                event = events.next() => match event {
                    Some(ClientEvent::Audio(data)) => {
                        // A full queue holds the reader here, but a failing
                        // recognizer must still be noticed
                        tokio::select! {
                            pushed = self.ingress.push(data) => {
                                if let Err(e) = pushed {
                                    self.reject_input(e);
                                }
                            }
                            exit = adapter_exit(&mut self.adapter) => break exit_reason(exit),
                        }
                    }
                    Some(ClientEvent::Text(text)) => match ClientCommand::parse(&text) {
                        Ok(ClientCommand::Stop) => break StopReason::ClientStop,
                        Err(e) => {
                            warn!(session_id = %self.session_id, "Invalid control message: {}", e);
                            let _ = self
                                .client
                                .send(ServerMessage::error(format!("invalid control message: {}", e)));
                        }
                    },
                    Some(ClientEvent::Disconnected) | None => break StopReason::Disconnected,
                },
            }
        };

        self.stop(reason).await
    }

    /// Tear the session down
    ///
    /// Closes the queue, ends the outbound sequence, waits (bounded) for the
    /// inbound sequence, drains pending caption writes and releases the
    /// call. A stream failure is reported to the client before anything is
    /// torn down. Calling this on an idle or closed session is a no-op.
    pub async fn stop(&mut self, reason: StopReason) -> SessionStats {
        let current = self.state.get();
        if matches!(current, SessionState::Idle | SessionState::Closed) {
            return self.stats();
        }

        info!(session_id = %self.session_id, reason = ?reason, "Stopping session");

        self.state.set(SessionState::Stopping);

        if let StopReason::StreamFailed(message) = &reason {
            let _ = self.client.send(ServerMessage::error(message.clone()));
        }
        self.stop_reason = Some(reason);

        let discarded = self.ingress.queue.close().await;
        if discarded > 0 {
            info!(session_id = %self.session_id, discarded, "Discarded queued audio at stop");
        }

        if let Some(adapter) = self.adapter.take() {
            adapter.shutdown(self.config.stop_timeout).await;
        }

        if let Some(writer) = self.caption_writer.take() {
            writer.finish(self.config.sink_drain_timeout).await;
        }

        self.state.set(SessionState::Closed);

        let stats = self.stats();
        if stats.degraded() {
            warn!(
                session_id = %self.session_id,
                captions_failed = stats.captions_failed,
                "Session closed with captions missing from the sink"
            );
        }
        info!(
            session_id = %self.session_id,
            frames_sent = stats.frames_sent,
            results = stats.results_forwarded,
            captions = stats.captions_written,
            "Session closed"
        );

        stats
    }

    /// Current session statistics
    pub fn stats(&self) -> SessionStats {
        SessionStats::snapshot(
            self.session_id.as_str(),
            self.state.get(),
            self.started_at,
            &self.counters,
            self.stop_reason.clone(),
        )
    }

    fn reject_input(&self, e: SessionError) {
        match e {
            SessionError::Frame(reason) => {
                warn!(session_id = %self.session_id, "Rejected audio frame: {}", reason);
                let _ = self
                    .client
                    .send(ServerMessage::error(format!("rejected audio frame: {}", reason)));
            }
            other => debug!(session_id = %self.session_id, "Audio not accepted: {}", other),
        }
    }
}

impl Drop for TranscriptionSession {
    fn drop(&mut self) {
        // Dropped without a completed stop sequence: make sure no task
        // outlives the session
        if let Some(adapter) = self.adapter.take() {
            warn!(session_id = %self.session_id, "Session dropped while active, aborting tasks");
            adapter.abort();
        }
        if let Some(writer) = self.caption_writer.take() {
            writer.abort();
        }
    }
}

async fn adapter_exit(adapter: &mut Option<DuplexAdapter>) -> AdapterExit {
    match adapter {
        Some(adapter) => adapter.exited().await,
        None => std::future::pending().await,
    }
}

fn exit_reason(exit: AdapterExit) -> StopReason {
    match exit {
        AdapterExit::Completed => {
            StopReason::StreamFailed("recognizer closed the stream".to_string())
        }
        AdapterExit::Failed(e) => StopReason::StreamFailed(e.to_string()),
    }
}
