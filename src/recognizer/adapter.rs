use super::backend::{OutboundHalf, RecognizerCall, ResultStream, StreamingRequest};
use super::config::RecognizerConfig;
use crate::audio::{AudioIngressQueue, Dequeued};
use crate::error::RecognizerError;
use crate::session::fanout::ResultFanOut;
use crate::session::state::SessionStateFlag;
use crate::session::stats::SessionCounters;
use chrono::Utc;
use futures::stream::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// How a recognition call ended, as seen by the adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterExit {
    /// The remote end closed the result stream cleanly
    Completed,

    /// The call failed; the adapter is finished and will not retry
    Failed(RecognizerError),
}

/// Delivers the first exit report to the lifecycle controller and drops the rest
#[derive(Clone)]
struct ExitReporter(Arc<Mutex<Option<oneshot::Sender<AdapterExit>>>>);

impl ExitReporter {
    fn new() -> (Self, oneshot::Receiver<AdapterExit>) {
        let (tx, rx) = oneshot::channel();
        (Self(Arc::new(Mutex::new(Some(tx)))), rx)
    }

    async fn report(&self, exit: AdapterExit) {
        if let Some(tx) = self.0.lock().await.take() {
            let _ = tx.send(exit);
        }
    }
}

/// Everything the outbound task needs besides the call itself
pub struct OutboundContext {
    pub session_id: String,
    pub config: RecognizerConfig,
    pub queue: Arc<AudioIngressQueue>,
    pub state: SessionStateFlag,
    pub counters: Arc<SessionCounters>,
    pub dequeue_poll: Duration,
    /// Deadline for each request; a call that stalls past it has failed
    pub send_timeout: Duration,
}

/// Owns one duplex recognition call for the life of a session
///
/// The outbound task sends the handshake and then audio pulled from the
/// ingress queue; the inbound task consumes results and drives the fan-out.
/// The two tasks share only the queue and the session state flag.
pub struct DuplexAdapter {
    session_id: String,
    outbound_task: JoinHandle<()>,
    inbound_task: JoinHandle<()>,
    exit_rx: Option<oneshot::Receiver<AdapterExit>>,
}

impl DuplexAdapter {
    pub fn spawn(call: RecognizerCall, ctx: OutboundContext, fanout: ResultFanOut) -> Self {
        let session_id = ctx.session_id.clone();
        let (reporter, exit_rx) = ExitReporter::new();

        let outbound_task = tokio::spawn(run_outbound(call.outbound, ctx, reporter.clone()));
        let inbound_task = tokio::spawn(run_inbound(
            session_id.clone(),
            call.inbound,
            fanout,
            reporter,
        ));

        Self {
            session_id,
            outbound_task,
            inbound_task,
            exit_rx: Some(exit_rx),
        }
    }

    /// Resolve once the call has ended
    ///
    /// Cancel-safe; intended for use inside `tokio::select!`. After it has
    /// resolved once, it never resolves again.
    pub async fn exited(&mut self) -> AdapterExit {
        let Some(rx) = self.exit_rx.as_mut() else {
            return std::future::pending().await;
        };

        let exit = rx.await.unwrap_or(AdapterExit::Completed);
        self.exit_rx = None;
        exit
    }

    /// Wait for both tasks to finish, aborting whatever is still running
    /// after `wait`
    ///
    /// The caller must already have moved the session out of the streaming
    /// state and closed the ingress queue.
    pub async fn shutdown(mut self, wait: Duration) {
        let deadline = Instant::now() + wait;

        if tokio::time::timeout_at(deadline, &mut self.outbound_task)
            .await
            .is_err()
        {
            warn!(session_id = %self.session_id, "Outbound task did not stop in time, aborting");
            self.outbound_task.abort();
        }

        match tokio::time::timeout_at(deadline, &mut self.inbound_task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) if e.is_panic() => {
                error!(session_id = %self.session_id, "Inbound task panicked: {}", e);
            }
            Ok(Err(_)) => {}
            Err(_) => {
                warn!(session_id = %self.session_id, "Recognizer did not close in time, aborting call");
                self.inbound_task.abort();
            }
        }

        debug!(session_id = %self.session_id, "Duplex adapter released");
    }

    pub(crate) fn abort(&self) {
        self.outbound_task.abort();
        self.inbound_task.abort();
    }
}

async fn run_outbound(
    mut outbound: Box<dyn OutboundHalf>,
    ctx: OutboundContext,
    reporter: ExitReporter,
) {
    info!(session_id = %ctx.session_id, "Outbound task started");

    let handshake = StreamingRequest::Config(ctx.config.clone());
    if let Err(e) = send_with_deadline(outbound.as_mut(), handshake, ctx.send_timeout).await {
        error!(session_id = %ctx.session_id, "Handshake failed: {}", e);
        reporter.report(AdapterExit::Failed(e)).await;
        return;
    }

    while ctx.state.keep_streaming() {
        match ctx.queue.dequeue_timeout(ctx.dequeue_poll).await {
            Dequeued::Frame(frame) => {
                // A stop may have landed while we were waiting
                if !ctx.state.keep_streaming() {
                    break;
                }

                let sequence = frame.sequence;
                let queued_ms = Utc::now()
                    .signed_duration_since(frame.received_at)
                    .num_milliseconds();
                debug!(
                    session_id = %ctx.session_id,
                    sequence,
                    bytes = frame.data.len(),
                    queued_ms,
                    "Sending audio frame"
                );

                let request = StreamingRequest::Audio(frame.into_bytes());
                if let Err(e) =
                    send_with_deadline(outbound.as_mut(), request, ctx.send_timeout).await
                {
                    error!(session_id = %ctx.session_id, sequence, "Failed to send audio: {}", e);
                    reporter.report(AdapterExit::Failed(e)).await;
                    return;
                }
                SessionCounters::incr(&ctx.counters.frames_sent);
            }
            // Silence: keep the call open and poll again
            Dequeued::Timeout => continue,
            Dequeued::Closed => break,
        }
    }

    match tokio::time::timeout(ctx.send_timeout, outbound.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            warn!(session_id = %ctx.session_id, "Failed to half-close recognition call: {}", e);
        }
        Err(_) => {
            warn!(
                session_id = %ctx.session_id,
                "Half-close did not complete within {:?}",
                ctx.send_timeout
            );
        }
    }

    info!(session_id = %ctx.session_id, "Outbound task stopped");
}

async fn send_with_deadline(
    outbound: &mut dyn OutboundHalf,
    request: StreamingRequest,
    deadline: Duration,
) -> Result<(), RecognizerError> {
    match tokio::time::timeout(deadline, outbound.send(request)).await {
        Ok(sent) => sent,
        Err(_) => Err(RecognizerError::Stalled(deadline)),
    }
}

async fn run_inbound(
    session_id: String,
    mut inbound: ResultStream,
    fanout: ResultFanOut,
    reporter: ExitReporter,
) {
    info!(session_id = %session_id, "Inbound task started");

    let exit = loop {
        match inbound.next().await {
            Some(Ok(result)) => fanout.publish(result),
            Some(Err(e)) => {
                error!(session_id = %session_id, "Recognition stream failed: {}", e);
                break AdapterExit::Failed(e);
            }
            None => break AdapterExit::Completed,
        }
    };

    reporter.report(exit).await;

    info!(session_id = %session_id, "Inbound task stopped");
}
