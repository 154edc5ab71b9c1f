//! Resting-face baseline calibration.
//!
//! The first N normalized classifier outputs of a session are averaged into a
//! rest vector describing the user's idle expression. The transition to
//! `Ready` is one-way: the rest vector never changes for the remainder of the
//! session.

use tracing::{debug, info};

use crate::types::{Emotion, EmotionScores};

#[derive(Debug)]
enum Phase {
    Collecting { samples: Vec<EmotionScores> },
    Ready { rest: EmotionScores },
}

/// Learns the per-session resting baseline from the first N samples.
#[derive(Debug)]
pub struct BaselineCalibrator {
    phase: Phase,
    needed: usize,
}

impl BaselineCalibrator {
    pub fn new(needed: usize) -> Self {
        Self {
            phase: Phase::Collecting {
                samples: Vec::with_capacity(needed),
            },
            needed,
        }
    }

    /// Feed one normalized score vector. Returns `true` exactly once: on the
    /// sample that completes calibration. Samples after that are ignored.
    pub fn observe(&mut self, scores: EmotionScores) -> bool {
        let Phase::Collecting { samples } = &mut self.phase else {
            return false;
        };

        samples.push(scores);
        debug!("Calibration sample {}/{}", samples.len(), self.needed);

        if samples.len() < self.needed {
            return false;
        }

        let mut rest = EmotionScores::default();
        for emotion in Emotion::ALL {
            let total: f32 = samples.iter().map(|s| s.get(emotion)).sum();
            rest.set(emotion, total / samples.len() as f32);
        }

        info!(
            "Calibration complete after {} samples (neutral baseline {:.3})",
            self.needed,
            rest.get(Emotion::Neutral)
        );
        self.phase = Phase::Ready { rest };
        true
    }

    /// The rest vector, once calibration has finished.
    pub fn rest(&self) -> Option<&EmotionScores> {
        match &self.phase {
            Phase::Ready { rest } => Some(rest),
            Phase::Collecting { .. } => None,
        }
    }

    /// Samples collected so far (saturates at the target count).
    pub fn collected(&self) -> usize {
        match &self.phase {
            Phase::Collecting { samples } => samples.len(),
            Phase::Ready { .. } => self.needed,
        }
    }

    pub fn needed(&self) -> usize {
        self.needed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completes_exactly_at_target() {
        let mut calibrator = BaselineCalibrator::new(20);

        for i in 0..19 {
            assert!(!calibrator.observe(EmotionScores::one_hot(Emotion::Neutral)));
            assert_eq!(calibrator.collected(), i + 1);
            assert!(calibrator.rest().is_none());
        }

        assert!(calibrator.observe(EmotionScores::one_hot(Emotion::Neutral)));
        assert!(calibrator.rest().is_some());
    }

    #[test]
    fn test_rest_is_per_category_mean() {
        let mut calibrator = BaselineCalibrator::new(4);

        let mut a = EmotionScores::default();
        a.set(Emotion::Happy, 0.8);
        a.set(Emotion::Neutral, 0.2);
        let mut b = EmotionScores::default();
        b.set(Emotion::Happy, 0.4);
        b.set(Emotion::Neutral, 0.6);

        calibrator.observe(a);
        calibrator.observe(a);
        calibrator.observe(b);
        calibrator.observe(b);

        let rest = calibrator.rest().unwrap();
        assert!((rest.get(Emotion::Happy) - 0.6).abs() < 1e-6);
        assert!((rest.get(Emotion::Neutral) - 0.4).abs() < 1e-6);
        assert_eq!(rest.get(Emotion::Angry), 0.0);
    }

    #[test]
    fn test_transition_is_one_way() {
        let mut calibrator = BaselineCalibrator::new(2);
        calibrator.observe(EmotionScores::one_hot(Emotion::Neutral));
        calibrator.observe(EmotionScores::one_hot(Emotion::Neutral));

        let before = *calibrator.rest().unwrap();
        assert!(!calibrator.observe(EmotionScores::one_hot(Emotion::Angry)));
        assert_eq!(*calibrator.rest().unwrap(), before);
        assert_eq!(calibrator.collected(), 2);
    }
}
