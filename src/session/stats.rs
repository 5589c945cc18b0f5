use super::state::SessionState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Why a session left the streaming state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum StopReason {
    /// Client sent `{"command":"stop"}`
    ClientStop,

    /// Transport went away
    Disconnected,

    /// Recognizer call errored or closed while the session was still streaming
    StreamFailed(String),
}

/// Live counters shared between the session's tasks
#[derive(Debug, Default)]
pub struct SessionCounters {
    pub frames_received: AtomicU64,
    pub frames_rejected: AtomicU64,
    pub frames_sent: AtomicU64,
    pub results_forwarded: AtomicU64,
    pub captions_written: AtomicU64,
    pub captions_failed: AtomicU64,
}

impl SessionCounters {
    pub fn incr(counter: &AtomicU64) -> u64 {
        counter.fetch_add(1, Ordering::SeqCst)
    }

    fn read(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::SeqCst)
    }
}

/// Statistics about a transcription session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: String,

    pub state: SessionState,

    /// When the session last entered `Starting`
    pub started_at: Option<DateTime<Utc>>,

    /// Time spent since `started_at`, in seconds
    pub duration_secs: f64,

    /// Frames accepted from the transport
    pub frames_received: u64,

    /// Malformed frames rejected at ingress
    pub frames_rejected: u64,

    /// Frames delivered to the recognizer
    pub frames_sent: u64,

    /// Transcription messages forwarded to the client
    pub results_forwarded: u64,

    /// Captions the sink accepted
    pub captions_written: u64,

    /// Captions dropped because the sink write failed
    pub captions_failed: u64,

    /// Set once the session has stopped
    pub stop_reason: Option<StopReason>,
}

impl SessionStats {
    pub(crate) fn snapshot(
        session_id: &str,
        state: SessionState,
        started_at: Option<DateTime<Utc>>,
        counters: &SessionCounters,
        stop_reason: Option<StopReason>,
    ) -> Self {
        let duration_secs = started_at
            .map(|at| Utc::now().signed_duration_since(at).num_milliseconds() as f64 / 1000.0)
            .unwrap_or(0.0);

        Self {
            session_id: session_id.to_string(),
            state,
            started_at,
            duration_secs,
            frames_received: SessionCounters::read(&counters.frames_received),
            frames_rejected: SessionCounters::read(&counters.frames_rejected),
            frames_sent: SessionCounters::read(&counters.frames_sent),
            results_forwarded: SessionCounters::read(&counters.results_forwarded),
            captions_written: SessionCounters::read(&counters.captions_written),
            captions_failed: SessionCounters::read(&counters.captions_failed),
            stop_reason,
        }
    }

    /// At least one caption was lost to a sink failure
    ///
    /// A session with no captions at all (no speech) is not degraded.
    pub fn degraded(&self) -> bool {
        self.captions_failed > 0
    }
}
