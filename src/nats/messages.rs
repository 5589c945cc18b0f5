use crate::recognizer::RecognizerConfig;
use serde::{Deserialize, Serialize};

/// Handshake published once when a recognition call opens
#[derive(Debug, Serialize, Deserialize)]
pub struct StreamingConfigMessage {
    pub session_id: String,
    pub config: RecognizerConfig,
    pub timestamp: String, // RFC3339 timestamp
}

/// Audio frame published to the speech worker
#[derive(Debug, Serialize, Deserialize)]
pub struct AudioFrameMessage {
    pub session_id: String,
    pub sequence: u32,
    pub audio: String, // Base64-encoded audio bytes
    pub timestamp: String, // RFC3339 timestamp
    #[serde(rename = "final")]
    pub final_frame: bool,
}

/// Transcript message received from the speech worker
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub session_id: String,
    pub text: String,
    pub partial: bool,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub confidence: Option<f32>,
}

/// Error reported by the speech worker for one call
#[derive(Debug, Serialize, Deserialize)]
pub struct RecognizerErrorMessage {
    pub session_id: String,
    pub message: String,
}

/// Subject carrying the handshake for `session_id`
pub fn config_subject(session_id: &str) -> String {
    format!("audio.{}.config", session_id)
}

/// Subject carrying audio frames for `session_id`
pub fn audio_subject(session_id: &str) -> String {
    format!("audio.{}.frame", session_id)
}

/// Wildcard covering every reply for `session_id`
pub fn results_subject(session_id: &str) -> String {
    format!("stt.{}.>", session_id)
}
