use crate::recognizer::Recognizer;
use crate::session::{SessionConfig, SessionRegistry};
use crate::sink::CaptionSink;
use std::sync::Arc;

/// Identity reported by the info and health endpoints
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub name: String,
    pub project_id: String,
    pub version: String,
}

/// Shared application state for HTTP handlers
///
/// Recognizer and sink are built once at startup and handed to every
/// session.
#[derive(Clone)]
pub struct AppState {
    pub recognizer: Arc<dyn Recognizer>,
    pub sink: Arc<dyn CaptionSink>,
    pub session_config: Arc<SessionConfig>,
    /// Session ids with a live connection
    pub sessions: SessionRegistry,
    pub service: Arc<ServiceInfo>,
}

impl AppState {
    pub fn new(
        recognizer: Arc<dyn Recognizer>,
        sink: Arc<dyn CaptionSink>,
        session_config: SessionConfig,
        service: ServiceInfo,
    ) -> Self {
        Self {
            recognizer,
            sink,
            session_config: Arc::new(session_config),
            sessions: SessionRegistry::new(),
            service: Arc::new(service),
        }
    }
}
