use super::state::AppState;
use crate::protocol::{ClientEvent, ServerMessage};
use crate::recognizer::transcribe_chunk as recognize_chunk;
use crate::session::{SessionId, TranscriptionSession};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json},
};
use base64::Engine;
use futures::stream::StreamExt;
use futures::SinkExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// How long queued messages may take to reach the client after a session ends
const CLIENT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TranscribeQuery {
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TranscribeRequest {
    /// Base64-encoded audio data (without data URL prefix)
    #[serde(rename = "audioChunk")]
    pub audio_chunk: String,
}

#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub success: bool,
    pub transcript: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub error: Option<String>,
}

impl TranscribeResponse {
    fn failed(status: StatusCode, session_id: String, error: String) -> axum::response::Response {
        (
            status,
            Json(Self {
                success: false,
                transcript: String::new(),
                session_id,
                error: Some(error),
            }),
        )
            .into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /
/// Service information
pub async fn root(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "service": state.service.name,
        "status": "running",
        "version": state.service.version,
        "endpoints": {
            "health": "/health",
            "websocket": "/ws/transcribe/{session_id}",
            "transcribe": "/api/transcribe"
        }
    }))
}

/// GET /health
/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "transcription-api",
        "project": state.service.project_id
    }))
}

/// GET /ws/transcribe/:session_id
/// Upgrade to a streaming transcription session
pub async fn transcribe_ws(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    upgrade: WebSocketUpgrade,
) -> impl IntoResponse {
    upgrade.on_upgrade(move |socket| handle_socket(state, session_id, socket))
}

/// POST /api/transcribe?sessionId=...
/// Transcribe a single base64-encoded audio chunk
pub async fn transcribe_chunk(
    State(state): State<AppState>,
    Query(query): Query<TranscribeQuery>,
    Json(req): Json<TranscribeRequest>,
) -> impl IntoResponse {
    let Some(raw_id) = query.session_id else {
        return TranscribeResponse::failed(
            StatusCode::UNPROCESSABLE_ENTITY,
            String::new(),
            "sessionId query parameter is required".to_string(),
        );
    };

    let session_id = match SessionId::parse(&raw_id) {
        Ok(id) => id,
        Err(e) => {
            return TranscribeResponse::failed(StatusCode::UNPROCESSABLE_ENTITY, raw_id, e.to_string())
        }
    };

    // A live streaming session owns the id's recognizer subjects and caption slot
    let _claim = match state.sessions.claim(&session_id) {
        Ok(claim) => claim,
        Err(e) => {
            warn!(session_id = %session_id, "Refusing chunk: {}", e);
            return TranscribeResponse::failed(
                StatusCode::CONFLICT,
                session_id.to_string(),
                e.to_string(),
            );
        }
    };

    if req.audio_chunk.is_empty() {
        return TranscribeResponse::failed(
            StatusCode::UNPROCESSABLE_ENTITY,
            session_id.to_string(),
            "audioChunk must not be empty".to_string(),
        );
    }

    let audio = match base64::engine::general_purpose::STANDARD.decode(req.audio_chunk.as_bytes()) {
        Ok(audio) => audio,
        Err(e) => {
            warn!(session_id = %session_id, "Base64 decode error: {}", e);
            return TranscribeResponse::failed(
                StatusCode::BAD_REQUEST,
                session_id.to_string(),
                format!("Invalid base64 audio data: {}", e),
            );
        }
    };

    let transcript = match recognize_chunk(
        state.recognizer.as_ref(),
        session_id.as_str(),
        &state.session_config.recognizer,
        audio,
        state.session_config.stop_timeout,
    )
    .await
    {
        Ok(transcript) => transcript,
        Err(e) => {
            error!(session_id = %session_id, "Transcription error: {}", e);
            return TranscribeResponse::failed(
                StatusCode::INTERNAL_SERVER_ERROR,
                session_id.to_string(),
                e.to_string(),
            );
        }
    };

    if !transcript.is_empty() {
        if let Err(e) = state.sink.write(session_id.as_str(), &transcript).await {
            error!(session_id = %session_id, "Failed to publish caption: {}", e);
        }
    }

    (
        StatusCode::OK,
        Json(TranscribeResponse {
            success: true,
            transcript,
            session_id: session_id.to_string(),
            error: None,
        }),
    )
        .into_response()
}

// ============================================================================
// WebSocket session
// ============================================================================

async fn handle_socket(state: AppState, session_id: String, socket: WebSocket) {
    let connection_id = uuid::Uuid::new_v4();
    info!(session_id = %session_id, %connection_id, "WebSocket connected");

    let (mut sender, receiver) = socket.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ServerMessage>();

    // Writer task: a slow client never blocks recognition
    let mut send_task = tokio::spawn(async move {
        while let Some(message) = out_rx.recv().await {
            let payload = match serde_json::to_string(&message) {
                Ok(payload) => payload,
                Err(e) => {
                    error!("Failed to serialize websocket payload: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(payload)).await.is_err() {
                break;
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    });

    let claimed = SessionId::parse(&session_id)
        .and_then(|id| state.sessions.claim(&id).map(|claim| (id, claim)));

    match claimed {
        Ok((id, claim)) => {
            let mut session = TranscriptionSession::new(
                id,
                (*state.session_config).clone(),
                Arc::clone(&state.recognizer),
                Arc::clone(&state.sink),
                out_tx.clone(),
            );

            let events = receiver
                .filter_map(|message| async move {
                    match message {
                        Ok(Message::Binary(data)) => Some(ClientEvent::Audio(data)),
                        Ok(Message::Text(text)) => Some(ClientEvent::Text(text)),
                        Ok(Message::Close(_)) | Err(_) => Some(ClientEvent::Disconnected),
                        Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => None,
                    }
                })
                .boxed();

            let stats = session.run(events).await;
            drop(session);
            drop(claim);

            info!(
                session_id = %session_id,
                %connection_id,
                frames = stats.frames_received,
                results = stats.results_forwarded,
                degraded = stats.degraded(),
                "Session finished"
            );
        }
        Err(e) => {
            warn!(session_id = %session_id, %connection_id, "Refusing connection: {}", e);
            let _ = out_tx.send(ServerMessage::error(e.to_string()));
        }
    }

    drop(out_tx);
    if tokio::time::timeout(CLIENT_FLUSH_TIMEOUT, &mut send_task)
        .await
        .is_err()
    {
        warn!(session_id = %session_id, %connection_id, "Client writer did not finish in time");
        send_task.abort();
    }

    info!(session_id = %session_id, %connection_id, "WebSocket closed");
}
