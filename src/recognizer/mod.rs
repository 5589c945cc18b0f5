//! Remote streaming recognition
//!
//! This module provides:
//! - The configuration handshake sent at the start of every call
//! - The `Recognizer` seam behind which the remote service sits
//! - The duplex adapter that binds one call to one session
//! - A NATS-backed recognizer and a one-shot chunk helper

pub mod adapter;
pub mod backend;
pub mod batch;
pub mod config;
pub mod nats;

pub use adapter::{AdapterExit, DuplexAdapter, OutboundContext};
pub use backend::{
    OutboundHalf, RecognitionResult, Recognizer, RecognizerCall, ResultStream, StreamingRequest,
};
pub use batch::transcribe_chunk;
pub use config::{AudioEncoding, Decoding, RecognitionFeatures, RecognizerConfig};
pub use nats::NatsRecognizer;
