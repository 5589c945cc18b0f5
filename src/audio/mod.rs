pub mod frame;
pub mod queue;

pub use frame::{validate_frame, AudioFrame, DEFAULT_MAX_FRAME_BYTES};
pub use queue::{AudioIngressQueue, Dequeued};
