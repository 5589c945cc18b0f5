use crate::audio::DEFAULT_MAX_FRAME_BYTES;
use crate::recognizer::{AudioEncoding, Decoding, RecognitionFeatures, RecognizerConfig};
use crate::session::SessionConfig;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

/// Prefix for environment overrides, e.g. `SAUTI__NATS__URL`
pub const ENV_PREFIX: &str = "SAUTI";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(default)]
    pub nats: NatsConfig,
    #[serde(default)]
    pub recognizer: RecognizerSettings,
    #[serde(default)]
    pub sink: SinkConfig,
    #[serde(default)]
    pub session: SessionSettings,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub project_id: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Comma-separated list of origins allowed by CORS
    #[serde(default)]
    pub allowed_origins: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct NatsConfig {
    pub url: String,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: "nats://localhost:4222".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodingMode {
    Auto,
    Explicit,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RecognizerSettings {
    pub languages: Vec<String>,
    pub model: String,
    pub decoding: DecodingMode,
    /// Only used with explicit decoding
    pub encoding: AudioEncoding,
    pub sample_rate_hertz: u32,
    pub channels: u16,
    pub punctuation: bool,
    pub word_timing: bool,
    pub interim_results: bool,
}

impl Default for RecognizerSettings {
    fn default() -> Self {
        let defaults = RecognizerConfig::default();
        Self {
            languages: defaults.languages,
            model: defaults.model,
            decoding: DecodingMode::Auto,
            encoding: AudioEncoding::Linear16,
            sample_rate_hertz: 16000,
            channels: 1,
            punctuation: defaults.features.punctuation,
            word_timing: defaults.features.word_timing,
            interim_results: defaults.interim_results,
        }
    }
}

impl RecognizerSettings {
    /// Build and validate the handshake every session will use
    pub fn resolve(&self) -> Result<RecognizerConfig> {
        let decoding = match self.decoding {
            DecodingMode::Auto => Decoding::Auto,
            DecodingMode::Explicit => Decoding::Explicit {
                encoding: self.encoding,
                sample_rate_hertz: self.sample_rate_hertz,
                channels: self.channels,
            },
        };

        let config = RecognizerConfig {
            languages: self.languages.clone(),
            decoding,
            model: self.model.clone(),
            features: RecognitionFeatures {
                punctuation: self.punctuation,
                word_timing: self.word_timing,
            },
            interim_results: self.interim_results,
        };

        config
            .validate()
            .context("Invalid recognizer configuration")?;

        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkBackend {
    Nats,
    Memory,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub backend: SinkBackend,
    /// JetStream key-value bucket holding the caption slots
    pub bucket: String,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            backend: SinkBackend::Nats,
            bucket: "captions".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub queue_capacity: usize,
    pub enqueue_timeout_ms: u64,
    pub dequeue_poll_ms: u64,
    pub send_timeout_ms: u64,
    pub stop_timeout_ms: u64,
    pub sink_drain_timeout_ms: u64,
    pub max_frame_bytes: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            enqueue_timeout_ms: 500,
            dequeue_poll_ms: 1000,
            send_timeout_ms: 5000,
            stop_timeout_ms: 5000,
            sink_drain_timeout_ms: 2000,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

impl Config {
    /// Load a config file (extension optional) layered with `SAUTI__*`
    /// environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read config from {}", path))?;

        Ok(settings.try_deserialize()?)
    }

    pub fn allowed_origins_list(&self) -> Vec<String> {
        self.service
            .allowed_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect()
    }

    /// Resolve the per-session settings, including the recognizer handshake
    pub fn session_config(&self) -> Result<SessionConfig> {
        let s = &self.session;
        Ok(SessionConfig {
            recognizer: self.recognizer.resolve()?,
            queue_capacity: s.queue_capacity,
            enqueue_timeout: Duration::from_millis(s.enqueue_timeout_ms),
            dequeue_poll: Duration::from_millis(s.dequeue_poll_ms),
            send_timeout: Duration::from_millis(s.send_timeout_ms),
            stop_timeout: Duration::from_millis(s.stop_timeout_ms),
            sink_drain_timeout: Duration::from_millis(s.sink_drain_timeout_ms),
            max_frame_bytes: s.max_frame_bytes,
        })
    }
}

fn default_region() -> String {
    "us".to_string()
}
