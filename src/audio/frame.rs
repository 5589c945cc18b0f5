use crate::error::FrameError;
use chrono::{DateTime, Utc};

/// Default upper bound for a single transport message of audio (1 MiB)
pub const DEFAULT_MAX_FRAME_BYTES: usize = 1024 * 1024;

/// One chunk of raw or container-encoded audio, exactly as one transport
/// message delivered it
///
/// The bytes are opaque to this crate; no decoding or transcoding happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame {
    /// Audio payload
    pub data: Vec<u8>,

    /// Position of this frame within its session (0-based, arrival order)
    pub sequence: u64,

    /// When the transport handed the frame over
    pub received_at: DateTime<Utc>,
}

impl AudioFrame {
    pub fn new(data: Vec<u8>, sequence: u64) -> Self {
        Self {
            data,
            sequence,
            received_at: Utc::now(),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

/// Check a transport payload before it becomes a frame
pub fn validate_frame(data: &[u8], max_bytes: usize) -> Result<(), FrameError> {
    if data.is_empty() {
        return Err(FrameError::Empty);
    }

    if data.len() > max_bytes {
        return Err(FrameError::TooLarge {
            size: data.len(),
            limit: max_bytes,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_payload() {
        assert_eq!(validate_frame(&[], 16), Err(FrameError::Empty));
    }

    #[test]
    fn rejects_oversized_payload() {
        let err = validate_frame(&[0u8; 17], 16).unwrap_err();
        assert_eq!(err, FrameError::TooLarge { size: 17, limit: 16 });
    }

    #[test]
    fn new_frame_is_stamped_on_arrival() {
        let before = Utc::now();
        let frame = AudioFrame::new(vec![7; 4], 3);
        assert!(frame.received_at >= before);
        assert!(frame.received_at <= Utc::now());
        assert_eq!(frame.into_bytes(), vec![7; 4]);
    }

    #[test]
    fn accepts_payload_at_limit() {
        assert!(validate_frame(&[1u8; 16], 16).is_ok());
    }
}
