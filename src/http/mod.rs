//! HTTP and WebSocket transport
//!
//! This module exposes the transcription core to classroom clients:
//! - GET /ws/transcribe/:session_id - Streaming transcription session
//! - POST /api/transcribe - One-shot chunk transcription
//! - GET / - Service information
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use handlers::{TranscribeRequest, TranscribeResponse};
pub use routes::create_router;
pub use state::{AppState, ServiceInfo};
