//! Engine processing thread.
//!
//! Runs alongside the async transport, pulling frames from the intake queue
//! at its own pace. The queue is the only backpressure point: the transport
//! drops frames when the engine is behind, and the engine blocks here (with a
//! short timeout) when there is nothing to do.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::classifier::EmotionClassifier;
use crate::frame::Frame;
use crate::state::SharedState;
use crate::types::SessionStatus;

use super::{EmotionEngine, EngineConfig};

/// How long one pull waits before re-checking the stop flag.
const PULL_TIMEOUT: Duration = Duration::from_millis(100);

/// Cadence of the periodic status log.
const STATUS_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// Run the engine loop. Spawn this on a dedicated thread.
///
/// Classifier warmup happens here so a broken model surfaces as a persistent
/// `Error` status rather than a per-frame failure. Per-frame classifier
/// failures are swallowed: the frame is treated as carrying no result and the
/// session continues.
pub fn run_engine(
    rx: Receiver<Frame>,
    mut classifier: Box<dyn EmotionClassifier>,
    config: EngineConfig,
    state: SharedState,
    stop_flag: Arc<AtomicBool>,
) {
    info!("Engine thread started");

    if let Err(e) = classifier.warmup() {
        error!("Classifier initialization failed: {}", e);
        state.set_status(SessionStatus::Error(e.to_string()));
        return;
    }

    state.set_status(SessionStatus::Calibrating {
        collected: 0,
        needed: config.calibration_samples,
    });

    let mut engine = EmotionEngine::new(&config, state.clone());
    let started = Instant::now();
    let mut frames_processed = 0u64;
    let mut last_status_log = Instant::now();

    loop {
        if stop_flag.load(Ordering::Relaxed) {
            break;
        }

        let frame = match rx.recv_timeout(PULL_TIMEOUT) {
            Ok(frame) => frame,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                info!("Intake queue disconnected");
                break;
            }
        };

        let now_ms = started.elapsed().as_millis() as u64;
        debug!(
            "Processing frame received at {}ms (age {}ms)",
            frame.received_ms,
            now_ms.saturating_sub(frame.received_ms)
        );

        match classifier.analyze(&frame) {
            Ok(result) => engine.observe(result, now_ms),
            Err(e) => {
                warn!("Classifier call failed, forfeiting frame: {}", e);
                engine.observe(None, now_ms);
            }
        }
        frames_processed += 1;

        if last_status_log.elapsed() >= STATUS_LOG_INTERVAL {
            let snapshot = state.snapshot();
            debug!(
                "Engine: {} frames, emotion {}, inner state {:.2}, status {}",
                frames_processed,
                snapshot.emotion.as_str(),
                snapshot.inner_state,
                snapshot.status.as_wire()
            );
            last_status_log = Instant::now();
        }
    }

    info!("Engine thread stopped after {} frames", frames_processed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ClassifierError;
    use crate::frame::frame_queue;
    use crate::types::EmotionScores;
    use image::RgbImage;

    struct FailingClassifier;

    impl EmotionClassifier for FailingClassifier {
        fn warmup(&mut self) -> Result<(), ClassifierError> {
            Err(ClassifierError::ModelLoadError("no model".to_string()))
        }

        fn analyze(&mut self, _: &Frame) -> Result<Option<EmotionScores>, ClassifierError> {
            unreachable!("warmup failed, analyze must never run")
        }
    }

    #[test]
    fn test_warmup_failure_sets_error_status_and_exits() {
        let (_sender, rx) = frame_queue();
        let state = SharedState::new();
        let stop_flag = Arc::new(AtomicBool::new(false));

        run_engine(
            rx,
            Box::new(FailingClassifier),
            EngineConfig::default(),
            state.clone(),
            stop_flag,
        );

        assert_eq!(
            state.snapshot().status,
            SessionStatus::Error("Failed to load model: no model".to_string())
        );
    }

    struct CountingClassifier {
        calls: Arc<AtomicBool>,
    }

    impl EmotionClassifier for CountingClassifier {
        fn warmup(&mut self) -> Result<(), ClassifierError> {
            Ok(())
        }

        fn analyze(&mut self, _: &Frame) -> Result<Option<EmotionScores>, ClassifierError> {
            self.calls.store(true, Ordering::SeqCst);
            Ok(Some(EmotionScores::one_hot(crate::types::Emotion::Neutral)))
        }
    }

    #[test]
    fn test_stop_flag_terminates_loop() {
        let (sender, rx) = frame_queue();
        let state = SharedState::new();
        let stop_flag = Arc::new(AtomicBool::new(false));
        let analyzed = Arc::new(AtomicBool::new(false));

        let classifier = Box::new(CountingClassifier {
            calls: analyzed.clone(),
        });

        let stop_clone = stop_flag.clone();
        let state_clone = state.clone();
        let handle = std::thread::spawn(move || {
            run_engine(rx, classifier, EngineConfig::default(), state_clone, stop_clone);
        });

        sender.push(Frame {
            image: RgbImage::new(2, 2),
            received_ms: 0,
        });
        std::thread::sleep(Duration::from_millis(300));
        stop_flag.store(true, Ordering::SeqCst);
        handle.join().unwrap();

        assert!(analyzed.load(Ordering::SeqCst));
        assert_eq!(
            state.snapshot().status,
            SessionStatus::Calibrating { collected: 1, needed: 20 }
        );
    }
}
