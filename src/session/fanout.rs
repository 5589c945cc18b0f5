use super::stats::SessionCounters;
use crate::protocol::ServerMessage;
use crate::recognizer::RecognitionResult;
use crate::sink::CaptionSink;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Routes recognition results to the client and, for final results, to the
/// caption sink
///
/// The client forward happens first and never waits on the sink. Sink writes
/// are queued to a per-session writer task so captions land in recognition
/// order without blocking the inbound consumer.
pub struct ResultFanOut {
    session_id: String,
    client: mpsc::UnboundedSender<ServerMessage>,
    captions: mpsc::UnboundedSender<String>,
    counters: Arc<SessionCounters>,
}

impl ResultFanOut {
    /// Build the fan-out and its caption writer task
    pub fn spawn(
        session_id: &str,
        client: mpsc::UnboundedSender<ServerMessage>,
        sink: Arc<dyn CaptionSink>,
        counters: Arc<SessionCounters>,
    ) -> (Self, CaptionWriter) {
        let (captions_tx, captions_rx) = mpsc::unbounded_channel();

        let writer = CaptionWriter::spawn(
            session_id.to_string(),
            sink,
            captions_rx,
            Arc::clone(&counters),
        );

        let fanout = Self {
            session_id: session_id.to_string(),
            client,
            captions: captions_tx,
            counters,
        };

        (fanout, writer)
    }

    /// Forward one result
    pub fn publish(&self, result: RecognitionResult) {
        if result.is_final {
            info!(
                session_id = %self.session_id,
                confidence = result.confidence.unwrap_or(0.0),
                "Final: {}",
                result.transcript
            );
        } else {
            debug!(session_id = %self.session_id, "Interim: {}", result.transcript);
        }

        let message = ServerMessage::transcription(&self.session_id, &result);
        if self.client.send(message).is_ok() {
            SessionCounters::incr(&self.counters.results_forwarded);
        } else {
            debug!(session_id = %self.session_id, "Client gone, transcription not forwarded");
        }

        if result.is_final && !result.transcript.trim().is_empty() {
            if self.captions.send(result.transcript).is_err() {
                warn!(session_id = %self.session_id, "Caption writer stopped, caption dropped");
            }
        }
    }
}

/// Per-session task that performs caption writes one at a time
pub struct CaptionWriter {
    session_id: String,
    handle: JoinHandle<()>,
}

impl CaptionWriter {
    fn spawn(
        session_id: String,
        sink: Arc<dyn CaptionSink>,
        mut captions: mpsc::UnboundedReceiver<String>,
        counters: Arc<SessionCounters>,
    ) -> Self {
        let task_session_id = session_id.clone();

        let handle = tokio::spawn(async move {
            while let Some(text) = captions.recv().await {
                match sink.write(&task_session_id, &text).await {
                    Ok(()) => {
                        SessionCounters::incr(&counters.captions_written);
                    }
                    Err(e) => {
                        // At most once: the caption is not retried
                        SessionCounters::incr(&counters.captions_failed);
                        error!(
                            session_id = %task_session_id,
                            sink = sink.name(),
                            "Failed to publish caption: {}",
                            e
                        );
                    }
                }
            }
        });

        Self { session_id, handle }
    }

    /// Wait for queued captions to be written once the fan-out is gone
    ///
    /// Writes still pending after `wait` are abandoned.
    pub async fn finish(mut self, wait: Duration) {
        match tokio::time::timeout(wait, &mut self.handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(session_id = %self.session_id, "Caption writer panicked: {}", e),
            Err(_) => {
                warn!(session_id = %self.session_id, "Caption writer did not drain in time, aborting");
                self.handle.abort();
            }
        }
    }

    pub(crate) fn abort(&self) {
        self.handle.abort();
    }
}
