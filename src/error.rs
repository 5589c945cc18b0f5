//! Error types for the streaming core
//!
//! Every error here is scoped to a single session. Nothing in this crate is
//! fatal to the process once startup has completed.

use crate::audio::AudioFrame;
use thiserror::Error;

/// A frame the transport handed us that cannot be forwarded to the recognizer
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("audio frame is empty")]
    Empty,

    #[error("audio frame is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },
}

/// Errors returned by the audio ingress queue
#[derive(Debug, Error)]
pub enum QueueError {
    /// The queue stayed full for the whole enqueue window. The frame is handed
    /// back so the caller can retry instead of losing audio.
    #[error("ingress queue is full")]
    Full(AudioFrame),

    #[error("ingress queue is closed")]
    Closed,
}

/// Errors surfaced by a remote recognition call
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecognizerError {
    #[error("invalid recognizer configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to open recognition call: {0}")]
    Connect(String),

    #[error("failed to send to recognizer: {0}")]
    Send(String),

    #[error("recognizer stream failed: {0}")]
    Remote(String),

    #[error("recognizer did not accept a request within {0:?}")]
    Stalled(std::time::Duration),

    #[error("recognition call already closed")]
    Closed,
}

/// Errors from the caption sink
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("caption sink unavailable: {0}")]
    Unavailable(String),

    #[error("caption write failed: {0}")]
    Write(String),

    #[error("failed to encode caption: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors from the session lifecycle controller
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid session id {0:?}")]
    InvalidId(String),

    #[error("session {session_id} cannot start from state {state}")]
    InvalidState { session_id: String, state: String },

    #[error("session {0} is already active")]
    AlreadyActive(String),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Recognizer(#[from] RecognizerError),
}
