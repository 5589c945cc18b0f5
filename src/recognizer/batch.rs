use super::backend::{Recognizer, StreamingRequest};
use super::config::RecognizerConfig;
use crate::error::RecognizerError;
use futures::stream::StreamExt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Transcribe one self-contained audio chunk
///
/// Opens a call, sends the handshake and the chunk, half-closes, and joins
/// the final transcripts. Returns an empty string when nothing was
/// recognized. Results that have not arrived within `wait` are dropped.
pub async fn transcribe_chunk(
    recognizer: &dyn Recognizer,
    session_id: &str,
    config: &RecognizerConfig,
    audio: Vec<u8>,
    wait: Duration,
) -> Result<String, RecognizerError> {
    info!(session_id = %session_id, "Audio chunk size: {} bytes", audio.len());

    let mut call = recognizer.open(session_id).await?;

    let config = RecognizerConfig {
        interim_results: false,
        ..config.clone()
    };
    call.outbound.send(StreamingRequest::Config(config)).await?;
    call.outbound.send(StreamingRequest::Audio(audio)).await?;
    call.outbound.close().await?;

    let mut finals: Vec<String> = Vec::new();
    let collect = async {
        while let Some(item) = call.inbound.next().await {
            let result = item?;
            if result.is_final {
                finals.push(result.transcript);
            }
        }
        Ok::<_, RecognizerError>(())
    };

    match tokio::time::timeout(wait, collect).await {
        Ok(outcome) => outcome?,
        Err(_) => warn!(session_id = %session_id, "Recognizer did not close within {:?}", wait),
    }

    let transcript = join_transcripts(&finals);
    if transcript.is_empty() {
        debug!(session_id = %session_id, "No speech detected in audio chunk");
    } else {
        info!(session_id = %session_id, "Transcribed: {}", transcript);
    }

    Ok(transcript)
}

fn join_transcripts(parts: &[String]) -> String {
    parts
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
