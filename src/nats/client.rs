use anyhow::{Context, Result};
use async_nats::Client;
use serde::Serialize;
use tracing::{debug, info};

/// Process-wide NATS connection shared by the recognizer bridge and the
/// caption sink
#[derive(Clone)]
pub struct NatsClient {
    client: Client,
}

impl NatsClient {
    /// Connect to NATS server
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Underlying connection handle (cheap to clone)
    pub fn inner(&self) -> Client {
        self.client.clone()
    }

    /// Serialize `message` as JSON and publish it on `subject`
    pub async fn publish_json<T: Serialize>(&self, subject: String, message: &T) -> Result<()> {
        let payload = serde_json::to_vec(message)?;
        let len = payload.len();

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .context("Failed to publish message")?;

        debug!("Published {} bytes to {}", len, subject);

        Ok(())
    }

    /// Subscribe to `subject` and make sure the server has registered the
    /// interest before returning
    pub async fn subscribe(&self, subject: String) -> Result<async_nats::Subscriber> {
        info!("Subscribing to {}", subject);

        let subscriber = self
            .client
            .subscribe(subject.clone())
            .await
            .context("Failed to subscribe")?;

        self.client
            .flush()
            .await
            .context("Failed to flush subscription")?;

        Ok(subscriber)
    }
}
