//! Messages exchanged with the client over the session transport
//!
//! Binary transport messages carry audio; text messages carry the JSON
//! documents defined here.

use crate::recognizer::RecognitionResult;
use serde::{Deserialize, Serialize};

/// Control messages the client may send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum ClientCommand {
    Stop,
}

impl ClientCommand {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Messages sent to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    Transcription {
        transcript: String,
        #[serde(rename = "isFinal")]
        is_final: bool,
        /// 0.0 when the recognizer did not report one
        confidence: f32,
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn transcription(session_id: &str, result: &RecognitionResult) -> Self {
        ServerMessage::Transcription {
            transcript: result.transcript.clone(),
            is_final: result.is_final,
            confidence: result.confidence.unwrap_or(0.0),
            session_id: session_id.to_string(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ServerMessage::Error { .. })
    }
}

/// Events the transport feeds into a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// One binary message of audio
    Audio(Vec<u8>),

    /// One text message
    Text(String),

    /// The connection closed
    Disconnected,
}
