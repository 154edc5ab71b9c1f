//! Emotion Engine
//!
//! Turns the per-frame classifier output into the stable session state. One
//! logical pass per frame:
//!
//! ```text
//! classifier output (raw scores | no face)
//!          |
//!          v
//!    Calibration ──── first N frames build the rest vector, nothing else runs
//!          |
//!          v
//!    Baseline removal ── subtract rest vector, renormalize
//!          |
//!          v
//!    Smoother ── sqrt-compressed EMA (decay instead when no face)
//!          |
//!          v
//!    Resolver ── confusion boosts, hysteresis, neutral threshold
//!          |
//!          v
//!    Debouncer ── label changes only after sustained evidence
//!          |
//!          v
//!    Inner state ── momentum update from the debounced label
//!          |
//!          v
//!    Shared snapshot (read by the transport)
//! ```
//!
//! The engine runs on a dedicated thread ([`run_engine`]) that owns the
//! intake queue receiver; see [`thread`].

pub mod baseline;
pub mod calibration;
pub mod commit;
pub mod momentum;
pub mod resolver;
pub mod smoother;
pub mod thread;

use tracing::debug;

use crate::state::SharedState;
use crate::types::{EmotionScores, SessionStatus};

use calibration::BaselineCalibrator;
use commit::LabelDebouncer;
use momentum::InnerState;
use resolver::LabelResolver;
use smoother::ScoreSmoother;

pub use thread::run_engine;

/// Tuning knobs for the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Frames averaged into the resting baseline
    pub calibration_samples: usize,
    /// EMA blend factor
    pub smoothing_alpha: f32,
    /// Per-frame EMA multiplier while no face is visible
    pub idle_decay: f32,
    /// Top score below which the frame resolves to neutral
    pub min_confidence: f32,
    /// Factor a sticky-pair challenger must beat the incumbent by
    pub hysteresis_ratio: f32,
    /// Sustained-evidence window before a label change commits
    pub commit_hold_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            calibration_samples: 20,
            smoothing_alpha: 0.3,
            idle_decay: 0.9,
            min_confidence: 0.40,
            hysteresis_ratio: 1.20,
            commit_hold_ms: 500,
        }
    }
}

/// Per-frame pipeline state. Single writer of the shared snapshot.
pub struct EmotionEngine {
    calibrator: BaselineCalibrator,
    smoother: ScoreSmoother,
    resolver: LabelResolver,
    debouncer: LabelDebouncer,
    inner: InnerState,
    state: SharedState,
}

impl EmotionEngine {
    pub fn new(config: &EngineConfig, state: SharedState) -> Self {
        Self {
            calibrator: BaselineCalibrator::new(config.calibration_samples),
            smoother: ScoreSmoother::new(config.smoothing_alpha, config.idle_decay),
            resolver: LabelResolver::new(config.min_confidence, config.hysteresis_ratio),
            debouncer: LabelDebouncer::new(config.commit_hold_ms),
            inner: InnerState::default(),
            state,
        }
    }

    /// Process one classifier result observed at `now_ms`.
    ///
    /// `None` means no face (or a swallowed per-frame classifier failure);
    /// the smoothed scores drain and the snapshot is left as-is.
    pub fn observe(&mut self, result: Option<EmotionScores>, now_ms: u64) {
        let Some(raw) = result else {
            debug!("No face observed, decaying smoothed scores");
            self.smoother.decay();
            return;
        };

        let raw = raw.normalized();

        let rest = match self.calibrator.rest() {
            Some(rest) => *rest,
            None => {
                if self.calibrator.observe(raw) {
                    self.state.set_status(SessionStatus::Active);
                } else {
                    self.state.set_status(SessionStatus::Calibrating {
                        collected: self.calibrator.collected(),
                        needed: self.calibrator.needed(),
                    });
                }
                return;
            }
        };

        let adjusted = baseline::remove_baseline(&raw, &rest);
        self.smoother.update(&adjusted);

        let resolved = self
            .resolver
            .resolve(self.smoother.scores(), self.debouncer.committed());
        let output = self.debouncer.observe(resolved.label, now_ms);
        let inner_state = self.inner.apply(output, resolved.confidence);

        self.state
            .publish(output, inner_state, resolved.confidence * 100.0);
    }
}
