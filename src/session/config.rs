use crate::audio::DEFAULT_MAX_FRAME_BYTES;
use crate::recognizer::RecognizerConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration shared by every transcription session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Resolved recognizer handshake
    pub recognizer: RecognizerConfig,

    /// Frames buffered between transport and recognizer
    /// Default: 64
    pub queue_capacity: usize,

    /// Longest single wait for queue space before the frame is handed back
    pub enqueue_timeout: Duration,

    /// Wait per dequeue attempt in the outbound loop
    /// Default: 1 second
    pub dequeue_poll: Duration,

    /// Longest a single request to the recognizer may take before the call
    /// is treated as failed
    /// Default: 5 seconds
    pub send_timeout: Duration,

    /// Upper bound for the whole stop sequence
    pub stop_timeout: Duration,

    /// How long queued caption writes may take to drain at stop
    pub sink_drain_timeout: Duration,

    /// Largest accepted audio frame in bytes
    pub max_frame_bytes: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            recognizer: RecognizerConfig::default(),
            queue_capacity: 64,
            enqueue_timeout: Duration::from_millis(500),
            dequeue_poll: Duration::from_secs(1),
            send_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
            sink_drain_timeout: Duration::from_secs(2),
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}
