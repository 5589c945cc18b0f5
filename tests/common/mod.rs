// Shared fakes for the integration tests
//
// `MockRecognizer` plays the remote speech service from a script and records
// every request it receives. `RecordingSink` records caption writes and can be
// told to fail them.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::StreamExt;
use sauti_captions::protocol::{ClientEvent, ServerMessage};
use sauti_captions::recognizer::{
    OutboundHalf, RecognitionResult, Recognizer, RecognizerCall, RecognizerConfig,
    StreamingRequest,
};
use sauti_captions::session::{
    SessionConfig, SessionId, SessionStateFlag, SessionStats, TranscriptionSession,
};
use sauti_captions::sink::{CaptionRecord, CaptionSink};
use sauti_captions::{RecognizerError, SinkError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// What the fake recognizer saw on one call
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Config(RecognizerConfig),
    Audio(Vec<u8>),
    Closed,
}

/// Behaviour of every call opened on a `MockRecognizer`
#[derive(Debug, Clone, Default)]
pub struct Script {
    /// Results emitted right after the n-th audio frame (1-based)
    pub after_frame: HashMap<usize, Vec<RecognitionResult>>,
    /// End the result stream cleanly right after the n-th audio frame
    pub end_after_frame: Option<usize>,
    /// Fail the call as soon as the handshake arrives
    pub fail_after_handshake: Option<String>,
    /// Refuse to open calls at all
    pub open_error: Option<String>,
    /// Delay applied before every audio send completes
    pub send_delay: Duration,
    /// Keep the result stream open after the half-close
    pub hold_open: bool,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn after_frame(mut self, frame: usize, results: Vec<RecognitionResult>) -> Self {
        self.after_frame.insert(frame, results);
        self
    }

    pub fn end_after_frame(mut self, frame: usize) -> Self {
        self.end_after_frame = Some(frame);
        self
    }

    pub fn fail_after_handshake(mut self, message: &str) -> Self {
        self.fail_after_handshake = Some(message.to_string());
        self
    }

    pub fn open_error(mut self, message: &str) -> Self {
        self.open_error = Some(message.to_string());
        self
    }

    pub fn send_delay(mut self, delay: Duration) -> Self {
        self.send_delay = delay;
        self
    }

    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }
}

type ResultSender = mpsc::UnboundedSender<Result<RecognitionResult, RecognizerError>>;

pub struct MockRecognizer {
    script: Script,
    calls: Arc<Mutex<Vec<(String, Arc<Mutex<Vec<Recorded>>>)>>>,
    held: Arc<Mutex<Vec<ResultSender>>>,
}

impl MockRecognizer {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: Arc::new(Mutex::new(Vec::new())),
            held: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Number of calls opened so far
    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Requests seen on the most recent call for `session_id`
    pub fn requests(&self, session_id: &str) -> Vec<Recorded> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(id, _)| id == session_id)
            .map(|(_, log)| log.lock().unwrap().clone())
            .unwrap_or_default()
    }

    /// Audio payloads seen on the most recent call for `session_id`
    pub fn audio(&self, session_id: &str) -> Vec<Vec<u8>> {
        self.requests(session_id)
            .into_iter()
            .filter_map(|r| match r {
                Recorded::Audio(data) => Some(data),
                _ => None,
            })
            .collect()
    }

    /// Wait until at least `count` frames reached the recognizer
    pub async fn wait_for_frames(&self, session_id: &str, count: usize) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
        while self.audio(session_id).len() < count {
            if tokio::time::Instant::now() > deadline {
                panic!(
                    "recognizer saw {} frames for {}, expected {}",
                    self.audio(session_id).len(),
                    session_id,
                    count
                );
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[async_trait]
impl Recognizer for MockRecognizer {
    async fn open(&self, session_id: &str) -> Result<RecognizerCall, RecognizerError> {
        if let Some(message) = &self.script.open_error {
            return Err(RecognizerError::Connect(message.clone()));
        }

        let log = Arc::new(Mutex::new(Vec::new()));
        self.calls
            .lock()
            .unwrap()
            .push((session_id.to_string(), Arc::clone(&log)));

        let (tx, rx) = mpsc::unbounded_channel();
        let inbound = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        })
        .boxed();

        let outbound = MockOutbound {
            script: self.script.clone(),
            log,
            results: Some(tx),
            held: Arc::clone(&self.held),
            frames: 0,
        };

        Ok(RecognizerCall {
            outbound: Box::new(outbound),
            inbound,
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

struct MockOutbound {
    script: Script,
    log: Arc<Mutex<Vec<Recorded>>>,
    results: Option<ResultSender>,
    held: Arc<Mutex<Vec<ResultSender>>>,
    frames: usize,
}

#[async_trait]
impl OutboundHalf for MockOutbound {
    async fn send(&mut self, request: StreamingRequest) -> Result<(), RecognizerError> {
        match request {
            StreamingRequest::Config(config) => {
                self.log.lock().unwrap().push(Recorded::Config(config));
                if let Some(message) = &self.script.fail_after_handshake {
                    if let Some(tx) = self.results.take() {
                        let _ = tx.send(Err(RecognizerError::Remote(message.clone())));
                    }
                }
            }
            StreamingRequest::Audio(data) => {
                if !self.script.send_delay.is_zero() {
                    tokio::time::sleep(self.script.send_delay).await;
                }
                self.log.lock().unwrap().push(Recorded::Audio(data));
                self.frames += 1;

                if let (Some(results), Some(tx)) =
                    (self.script.after_frame.get(&self.frames), self.results.as_ref())
                {
                    for result in results {
                        let _ = tx.send(Ok(result.clone()));
                    }
                }

                if self.script.end_after_frame == Some(self.frames) {
                    self.results = None;
                }
            }
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), RecognizerError> {
        self.log.lock().unwrap().push(Recorded::Closed);
        if let Some(tx) = self.results.take() {
            if self.script.hold_open {
                self.held.lock().unwrap().push(tx);
            }
        }
        Ok(())
    }
}

/// Caption sink that records writes and can simulate failures
#[derive(Default)]
pub struct RecordingSink {
    writes: Mutex<Vec<(String, String)>>,
    failing: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let sink = Self::default();
        sink.failing.store(true, Ordering::SeqCst);
        Arc::new(sink)
    }

    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl CaptionSink for RecordingSink {
    async fn write(&self, session_id: &str, text: &str) -> Result<(), SinkError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SinkError::Write("simulated sink outage".to_string()));
        }
        self.writes
            .lock()
            .unwrap()
            .push((session_id.to_string(), text.to_string()));
        Ok(())
    }

    async fn latest(&self, session_id: &str) -> Result<Option<CaptionRecord>, SinkError> {
        Ok(self
            .writes
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(id, _)| id == session_id)
            .map(|(id, text)| CaptionRecord {
                session_id: id.clone(),
                text: text.clone(),
                timestamp: Utc::now(),
            }))
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Session settings tuned for fast tests
pub fn test_session_config() -> SessionConfig {
    SessionConfig {
        queue_capacity: 64,
        enqueue_timeout: Duration::from_millis(50),
        dequeue_poll: Duration::from_millis(20),
        send_timeout: Duration::from_secs(1),
        stop_timeout: Duration::from_secs(1),
        sink_drain_timeout: Duration::from_secs(1),
        ..Default::default()
    }
}

/// A session running on its own task, driven like a transport would
pub struct SessionHarness {
    events: futures::channel::mpsc::UnboundedSender<ClientEvent>,
    client: mpsc::UnboundedReceiver<ServerMessage>,
    pub state: SessionStateFlag,
    task: JoinHandle<SessionStats>,
}

impl SessionHarness {
    pub fn spawn(
        session_id: &str,
        config: SessionConfig,
        recognizer: Arc<dyn Recognizer>,
        sink: Arc<dyn CaptionSink>,
    ) -> Self {
        let (client_tx, client_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = futures::channel::mpsc::unbounded();

        let mut session = TranscriptionSession::new(
            SessionId::parse(session_id).unwrap(),
            config,
            recognizer,
            sink,
            client_tx,
        );
        let state = session.state_flag();

        let task = tokio::spawn(async move { session.run(events_rx).await });

        Self {
            events: events_tx,
            client: client_rx,
            state,
            task,
        }
    }

    pub fn send_audio(&self, data: Vec<u8>) {
        self.events
            .unbounded_send(ClientEvent::Audio(data))
            .unwrap();
    }

    pub fn send_text(&self, text: &str) {
        self.events
            .unbounded_send(ClientEvent::Text(text.to_string()))
            .unwrap();
    }

    pub fn stop(&self) {
        self.send_text(r#"{"command":"stop"}"#);
    }

    pub fn disconnect(&self) {
        self.events.unbounded_send(ClientEvent::Disconnected).unwrap();
    }

    /// Next message for the client, failing the test after two seconds
    pub async fn next_message(&mut self) -> ServerMessage {
        tokio::time::timeout(Duration::from_secs(2), self.client.recv())
            .await
            .expect("timed out waiting for a client message")
            .expect("client channel closed")
    }

    /// Wait for the session to close and collect everything sent to the client
    pub async fn finish(mut self) -> (SessionStats, Vec<ServerMessage>) {
        let stats = tokio::time::timeout(Duration::from_secs(3), self.task)
            .await
            .expect("session did not close in time")
            .expect("session task panicked");

        let mut messages = Vec::new();
        while let Ok(message) = self.client.try_recv() {
            messages.push(message);
        }

        (stats, messages)
    }
}

pub fn transcriptions(messages: &[ServerMessage]) -> Vec<&ServerMessage> {
    messages
        .iter()
        .filter(|m| matches!(m, ServerMessage::Transcription { .. }))
        .collect()
}

pub fn errors(messages: &[ServerMessage]) -> Vec<&ServerMessage> {
    messages.iter().filter(|m| m.is_error()).collect()
}
