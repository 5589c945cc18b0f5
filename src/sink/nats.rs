use super::{caption_key, CaptionRecord, CaptionSink};
use crate::error::SinkError;
use async_nats::jetstream::{self, kv};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Document stored in the caption slot; the timestamp comes from the
/// server's entry metadata
#[derive(Debug, Serialize, Deserialize)]
struct StoredCaption {
    text: String,
}

/// Caption sink backed by a NATS JetStream key-value bucket
pub struct NatsCaptionSink {
    store: kv::Store,
    bucket: String,
}

impl NatsCaptionSink {
    /// Bind to `bucket`, creating it on first use
    ///
    /// Called once at process start; an error here should abort startup.
    pub async fn connect(client: async_nats::Client, bucket: &str) -> Result<Self, SinkError> {
        info!("Opening caption bucket {}", bucket);

        let context = jetstream::new(client);

        let store = match context.get_key_value(bucket).await {
            Ok(store) => store,
            Err(_) => context
                .create_key_value(kv::Config {
                    bucket: bucket.to_string(),
                    description: "Latest caption per classroom session".to_string(),
                    history: 1,
                    ..Default::default()
                })
                .await
                .map_err(|e| SinkError::Unavailable(e.to_string()))?,
        };

        info!("Caption bucket {} ready", bucket);

        Ok(Self {
            store,
            bucket: bucket.to_string(),
        })
    }
}

#[async_trait]
impl CaptionSink for NatsCaptionSink {
    async fn write(&self, session_id: &str, text: &str) -> Result<(), SinkError> {
        let key = caption_key(session_id);
        let payload = serde_json::to_vec(&StoredCaption {
            text: text.to_string(),
        })?;

        let revision = self
            .store
            .put(key.as_str(), payload.into())
            .await
            .map_err(|e| SinkError::Write(e.to_string()))?;

        debug!(bucket = %self.bucket, key = %key, revision, "Caption written");

        Ok(())
    }

    async fn latest(&self, session_id: &str) -> Result<Option<CaptionRecord>, SinkError> {
        let key = caption_key(session_id);

        let entry = self
            .store
            .entry(key.as_str())
            .await
            .map_err(|e| SinkError::Unavailable(e.to_string()))?;

        let Some(entry) = entry else {
            return Ok(None);
        };

        // Deleted or purged slots still have an entry with an empty value
        if entry.value.is_empty() {
            return Ok(None);
        }

        let stored: StoredCaption = serde_json::from_slice(&entry.value)?;
        let timestamp =
            DateTime::<Utc>::from_timestamp(entry.created.unix_timestamp(), entry.created.nanosecond())
                .unwrap_or_else(Utc::now);

        Ok(Some(CaptionRecord {
            session_id: session_id.to_string(),
            text: stored.text,
            timestamp,
        }))
    }

    fn name(&self) -> &str {
        "nats-kv"
    }
}
