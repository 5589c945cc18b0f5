use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Lifecycle of one transcription session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum SessionState {
    Idle = 0,
    Starting = 1,
    Streaming = 2,
    Stopping = 3,
    Closed = 4,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => SessionState::Idle,
            1 => SessionState::Starting,
            2 => SessionState::Streaming,
            3 => SessionState::Stopping,
            _ => SessionState::Closed,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Starting => "starting",
            SessionState::Streaming => "streaming",
            SessionState::Stopping => "stopping",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Shared lifecycle flag
///
/// Read by the outbound generator on every iteration; written only by the
/// lifecycle controller.
#[derive(Debug, Clone)]
pub struct SessionStateFlag(Arc<AtomicU8>);

impl SessionStateFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicU8::new(SessionState::Idle as u8)))
    }

    pub fn get(&self) -> SessionState {
        SessionState::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub(crate) fn set(&self, state: SessionState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }

    /// Whether the outbound generator should keep pulling audio
    pub fn keep_streaming(&self) -> bool {
        matches!(
            self.get(),
            SessionState::Starting | SessionState::Streaming
        )
    }
}

impl Default for SessionStateFlag {
    fn default() -> Self {
        Self::new()
    }
}
