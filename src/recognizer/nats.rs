use super::backend::{
    OutboundHalf, RecognitionResult, Recognizer, RecognizerCall, ResultStream, StreamingRequest,
};
use crate::error::RecognizerError;
use crate::nats::messages::{
    audio_subject, config_subject, results_subject, AudioFrameMessage, RecognizerErrorMessage,
    StreamingConfigMessage, TranscriptMessage,
};
use crate::nats::NatsClient;
use async_trait::async_trait;
use base64::Engine;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

/// Remote recognizer reached through a speech worker on NATS
///
/// Requests go out on `audio.{session}.config` and `audio.{session}.frame`;
/// the worker answers on `stt.{session}.text.partial`,
/// `stt.{session}.text.final`, `stt.{session}.error` and
/// `stt.{session}.closed`.
pub struct NatsRecognizer {
    nats: NatsClient,
}

impl NatsRecognizer {
    pub fn new(nats: NatsClient) -> Self {
        Self { nats }
    }
}

#[async_trait]
impl Recognizer for NatsRecognizer {
    async fn open(&self, session_id: &str) -> Result<RecognizerCall, RecognizerError> {
        // Subscribe before the handshake goes out so no reply is missed
        let subscriber = self
            .nats
            .subscribe(results_subject(session_id))
            .await
            .map_err(|e| RecognizerError::Connect(format!("{:#}", e)))?;

        info!(session_id = %session_id, "Recognition call opened");

        let owner = session_id.to_string();
        let inbound: ResultStream = stream::unfold(Some(subscriber), move |state| {
            let owner = owner.clone();
            async move {
                let mut subscriber = state?;
                loop {
                    let message = subscriber.next().await?;
                    let subject = message.subject.to_string();
                    match parse_reply(&owner, &subject, &message.payload) {
                        Reply::Result(result) => return Some((Ok(result), Some(subscriber))),
                        Reply::Failed(e) => return Some((Err(e), None)),
                        Reply::Closed => {
                            debug!(session_id = %owner, "Speech worker closed the call");
                            return None;
                        }
                        Reply::Ignored => continue,
                    }
                }
            }
        })
        .boxed();

        let outbound = NatsOutbound {
            nats: self.nats.clone(),
            session_id: session_id.to_string(),
            sequence: 0,
            closed: false,
        };

        Ok(RecognizerCall {
            outbound: Box::new(outbound),
            inbound,
        })
    }

    fn name(&self) -> &str {
        "nats"
    }
}

struct NatsOutbound {
    nats: NatsClient,
    session_id: String,
    sequence: u32,
    closed: bool,
}

impl NatsOutbound {
    async fn publish_frame(&mut self, audio: &[u8], final_frame: bool) -> Result<(), RecognizerError> {
        let message = AudioFrameMessage {
            session_id: self.session_id.clone(),
            sequence: self.sequence,
            audio: base64::engine::general_purpose::STANDARD.encode(audio),
            timestamp: chrono::Utc::now().to_rfc3339(),
            final_frame,
        };

        self.nats
            .publish_json(audio_subject(&self.session_id), &message)
            .await
            .map_err(|e| RecognizerError::Send(format!("{:#}", e)))?;

        self.sequence = self.sequence.wrapping_add(1);
        Ok(())
    }
}

#[async_trait]
impl OutboundHalf for NatsOutbound {
    async fn send(&mut self, request: StreamingRequest) -> Result<(), RecognizerError> {
        if self.closed {
            return Err(RecognizerError::Closed);
        }

        match request {
            StreamingRequest::Config(config) => {
                let message = StreamingConfigMessage {
                    session_id: self.session_id.clone(),
                    config,
                    timestamp: chrono::Utc::now().to_rfc3339(),
                };
                self.nats
                    .publish_json(config_subject(&self.session_id), &message)
                    .await
                    .map_err(|e| RecognizerError::Send(format!("{:#}", e)))
            }
            StreamingRequest::Audio(audio) => self.publish_frame(&audio, false).await,
        }
    }

    async fn close(&mut self) -> Result<(), RecognizerError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        // Empty final frame marks the end of audio
        self.publish_frame(&[], true).await
    }
}

#[derive(Debug, PartialEq)]
enum Reply {
    Result(RecognitionResult),
    Failed(RecognizerError),
    Closed,
    Ignored,
}

fn parse_reply(session_id: &str, subject: &str, payload: &[u8]) -> Reply {
    if subject.ends_with(".closed") {
        return Reply::Closed;
    }

    if subject.ends_with(".error") {
        let message = match serde_json::from_slice::<RecognizerErrorMessage>(payload) {
            Ok(msg) => msg.message,
            Err(_) => String::from_utf8_lossy(payload).into_owned(),
        };
        return Reply::Failed(RecognizerError::Remote(message));
    }

    if subject.ends_with(".text.partial") || subject.ends_with(".text.final") {
        return match serde_json::from_slice::<TranscriptMessage>(payload) {
            Ok(transcript) if transcript.session_id == session_id => {
                let is_final = !transcript.partial;
                Reply::Result(RecognitionResult {
                    transcript: transcript.text,
                    is_final,
                    confidence: if is_final { transcript.confidence } else { None },
                })
            }
            Ok(transcript) => {
                warn!(
                    "Dropping transcript for session {} delivered on {}",
                    transcript.session_id, subject
                );
                Reply::Ignored
            }
            Err(e) => {
                warn!("Failed to parse transcript message: {}", e);
                Reply::Ignored
            }
        };
    }

    Reply::Ignored
}
