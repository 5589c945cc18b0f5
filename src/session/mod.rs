//! Transcription session management
//!
//! This module provides the `TranscriptionSession` lifecycle controller that
//! coordinates:
//! - The audio ingress queue fed by the transport
//! - The duplex adapter bound to one remote recognition call
//! - Result fan-out to the client and the caption sink
//! - Start, stop and failure handling with guaranteed teardown

mod config;
pub mod fanout;
mod id;
mod registry;
mod session;
pub mod state;
pub mod stats;

pub use config::SessionConfig;
pub use fanout::{CaptionWriter, ResultFanOut};
pub use id::SessionId;
pub use registry::{SessionClaim, SessionRegistry};
pub use session::TranscriptionSession;
pub use state::{SessionState, SessionStateFlag};
pub use stats::{SessionCounters, SessionStats, StopReason};
