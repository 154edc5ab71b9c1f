//! Frame intake queue.
//!
//! A bounded, lossy buffer between the transport (producer) and the engine
//! thread (consumer). The producer never blocks: when the queue already holds
//! two frames the new one is silently dropped and counted, keeping the engine
//! working on fresh input even when the classifier falls behind.

use image::RgbImage;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::Arc;
use tracing::trace;

/// Maximum number of frames buffered ahead of the engine.
pub const QUEUE_DEPTH: usize = 2;

/// A decoded camera frame ready for classification.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: RgbImage,
    /// Milliseconds since session start when the frame arrived.
    pub received_ms: u64,
}

/// Producer half of the intake queue.
#[derive(Clone)]
pub struct FrameSender {
    tx: SyncSender<Frame>,
    dropped: Arc<AtomicU64>,
}

impl FrameSender {
    /// Offer a frame. Drops silently when the engine is behind.
    pub fn push(&self, frame: Frame) {
        match self.tx.try_send(frame) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                trace!("Intake queue full, dropping frame");
            }
            Err(TrySendError::Disconnected(_)) => {
                // Engine is gone; nothing useful to do with the frame.
            }
        }
    }

    /// Total frames dropped because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Create the intake queue. The receiver goes to the engine thread, which
/// pulls with a short timeout so it can notice the stop flag.
pub fn frame_queue() -> (FrameSender, Receiver<Frame>) {
    let (tx, rx) = mpsc::sync_channel(QUEUE_DEPTH);
    let sender = FrameSender {
        tx,
        dropped: Arc::new(AtomicU64::new(0)),
    };
    (sender, rx)
}
