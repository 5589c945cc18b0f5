//! Caption sink: the external key-value store holding the latest caption
//! of every session
//!
//! Writes are single upserts to `captions/{session_id}/latest`. The write
//! timestamp is assigned by the store, never by the caller.

mod memory;
mod nats;

pub use memory::MemoryCaptionSink;
pub use nats::NatsCaptionSink;

use crate::error::SinkError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Key of the "latest caption" slot for a session
pub fn caption_key(session_id: &str) -> String {
    format!("captions/{}/latest", session_id)
}

/// Value stored in the caption slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionRecord {
    pub session_id: String,

    /// Transcript exactly as recognized
    pub text: String,

    /// Assigned by the store when the write landed
    pub timestamp: DateTime<Utc>,
}

/// Best-effort writer for finalized captions
///
/// Built once per process; initialization failures surface at startup.
#[async_trait]
pub trait CaptionSink: Send + Sync {
    /// Upsert the latest caption for `session_id`
    async fn write(&self, session_id: &str, text: &str) -> Result<(), SinkError>;

    /// Read back the latest caption for `session_id`
    async fn latest(&self, session_id: &str) -> Result<Option<CaptionRecord>, SinkError>;

    /// Sink name for logging
    fn name(&self) -> &str;
}
