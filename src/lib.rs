pub mod audio;
pub mod config;
pub mod error;
pub mod http;
pub mod nats;
pub mod protocol;
pub mod recognizer;
pub mod session;
pub mod sink;

pub use audio::{AudioFrame, AudioIngressQueue, Dequeued};
pub use config::Config;
pub use error::{FrameError, QueueError, RecognizerError, SessionError, SinkError};
pub use http::{create_router, AppState, ServiceInfo};
pub use nats::NatsClient;
pub use protocol::{ClientCommand, ClientEvent, ServerMessage};
pub use recognizer::{
    NatsRecognizer, RecognitionResult, Recognizer, RecognizerCall, RecognizerConfig,
    StreamingRequest,
};
pub use session::{
    SessionConfig, SessionId, SessionRegistry, SessionState, SessionStats, StopReason,
    TranscriptionSession,
};
pub use sink::{caption_key, CaptionRecord, CaptionSink, MemoryCaptionSink, NatsCaptionSink};
