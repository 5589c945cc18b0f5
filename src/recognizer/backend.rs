use super::config::RecognizerConfig;
use crate::error::RecognizerError;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// One result emitted by the recognizer
///
/// Interim results are superseded by whatever comes next; they are not
/// deltas and must never be concatenated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub transcript: String,

    pub is_final: bool,

    /// Only reported for final results
    pub confidence: Option<f32>,
}

impl RecognitionResult {
    pub fn interim(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: false,
            confidence: None,
        }
    }

    pub fn final_result(transcript: impl Into<String>, confidence: Option<f32>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: true,
            confidence,
        }
    }
}

/// Messages on the outbound side of a recognition call
#[derive(Debug, Clone, PartialEq)]
pub enum StreamingRequest {
    /// Always the first message
    Config(RecognizerConfig),

    /// Raw audio payload
    Audio(Vec<u8>),
}

/// Inbound side of a recognition call
pub type ResultStream = BoxStream<'static, Result<RecognitionResult, RecognizerError>>;

/// Send half of a duplex recognition call
#[async_trait]
pub trait OutboundHalf: Send {
    /// Send one request on the call
    async fn send(&mut self, request: StreamingRequest) -> Result<(), RecognizerError>;

    /// Half-close the call: no more audio will follow
    async fn close(&mut self) -> Result<(), RecognizerError>;
}

/// One open duplex recognition call
pub struct RecognizerCall {
    pub outbound: Box<dyn OutboundHalf>,
    pub inbound: ResultStream,
}

/// A remote streaming recognizer
///
/// Constructed once per process and shared by every session.
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Open a new duplex call for `session_id`
    async fn open(&self, session_id: &str) -> Result<RecognizerCall, RecognizerError>;

    /// Backend name for logging
    fn name(&self) -> &str;
}
