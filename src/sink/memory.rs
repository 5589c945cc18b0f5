use super::{caption_key, CaptionRecord, CaptionSink};
use crate::error::SinkError;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// In-process caption store for local runs without a NATS server
#[derive(Debug, Default)]
pub struct MemoryCaptionSink {
    slots: RwLock<HashMap<String, CaptionRecord>>,
}

impl MemoryCaptionSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw lookup by store key
    pub async fn get(&self, key: &str) -> Option<CaptionRecord> {
        self.slots.read().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.is_empty()
    }
}

#[async_trait]
impl CaptionSink for MemoryCaptionSink {
    async fn write(&self, session_id: &str, text: &str) -> Result<(), SinkError> {
        let key = caption_key(session_id);
        let record = CaptionRecord {
            session_id: session_id.to_string(),
            text: text.to_string(),
            timestamp: Utc::now(),
        };

        self.slots.write().await.insert(key.clone(), record);
        debug!(key = %key, "Caption stored in memory");

        Ok(())
    }

    async fn latest(&self, session_id: &str) -> Result<Option<CaptionRecord>, SinkError> {
        Ok(self.get(&caption_key(session_id)).await)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
