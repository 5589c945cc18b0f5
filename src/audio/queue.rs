use super::frame::AudioFrame;
use crate::error::QueueError;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::time::{timeout_at, Instant};
use tracing::debug;

/// Outcome of a bounded wait on the queue
#[derive(Debug, PartialEq, Eq)]
pub enum Dequeued {
    /// Next frame in arrival order
    Frame(AudioFrame),

    /// Nothing arrived within the wait window; the queue is still open
    Timeout,

    /// The queue was closed; no further frames will ever be returned
    Closed,
}

/// Bounded, ordered buffer between the transport read loop and the
/// recognizer send loop
///
/// A full queue applies backpressure: `enqueue` waits for space up to its
/// timeout and then hands the frame back instead of dropping it.
pub struct AudioIngressQueue {
    frames: Mutex<VecDeque<AudioFrame>>,
    capacity: usize,
    enqueue_timeout: Duration,
    closed: AtomicBool,
    frame_available: Notify,
    space_available: Notify,
}

impl AudioIngressQueue {
    pub fn new(capacity: usize, enqueue_timeout: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            enqueue_timeout,
            closed: AtomicBool::new(false),
            frame_available: Notify::new(),
            space_available: Notify::new(),
        }
    }

    /// Append a frame, waiting at most the enqueue timeout for space
    pub async fn enqueue(&self, frame: AudioFrame) -> Result<(), QueueError> {
        let deadline = Instant::now() + self.enqueue_timeout;

        loop {
            // Register for wakeups before inspecting the buffer so a dequeue
            // between the check and the wait is not missed.
            let space = self.space_available.notified();
            tokio::pin!(space);
            space.as_mut().enable();

            {
                let mut frames = self.frames.lock().await;
                if self.is_closed() {
                    return Err(QueueError::Closed);
                }
                if frames.len() < self.capacity {
                    frames.push_back(frame);
                    drop(frames);
                    self.frame_available.notify_one();
                    return Ok(());
                }
            }

            if timeout_at(deadline, space).await.is_err() {
                return Err(QueueError::Full(frame));
            }
        }
    }

    /// Take the oldest frame, waiting at most `wait` for one to arrive
    pub async fn dequeue_timeout(&self, wait: Duration) -> Dequeued {
        let deadline = Instant::now() + wait;

        loop {
            let available = self.frame_available.notified();
            tokio::pin!(available);
            available.as_mut().enable();

            {
                let mut frames = self.frames.lock().await;
                if self.is_closed() {
                    return Dequeued::Closed;
                }
                if let Some(frame) = frames.pop_front() {
                    drop(frames);
                    self.space_available.notify_one();
                    return Dequeued::Frame(frame);
                }
            }

            if timeout_at(deadline, available).await.is_err() {
                return Dequeued::Timeout;
            }
        }
    }

    /// Close the queue, discarding anything still buffered
    ///
    /// Returns the number of frames that were discarded. Every blocked
    /// producer and consumer is woken and observes the closed state.
    pub async fn close(&self) -> usize {
        self.closed.store(true, Ordering::SeqCst);

        let discarded = {
            let mut frames = self.frames.lock().await;
            let count = frames.len();
            frames.clear();
            count
        };

        self.frame_available.notify_waiters();
        self.space_available.notify_waiters();

        if discarded > 0 {
            debug!(discarded, "Ingress queue closed with frames pending");
        }

        discarded
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.frames.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.frames.lock().await.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
