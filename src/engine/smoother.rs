//! Temporal smoothing.
//!
//! An exponential moving average over a square-root compression of the
//! adjusted scores. The compression boosts small-but-real signals (disgust,
//! surprise) relative to dominant ones before blending, at the cost of the
//! scale no longer being a probability.

use crate::types::{Emotion, EmotionScores};

/// Per-category EMA with square-root compression.
#[derive(Debug)]
pub struct ScoreSmoother {
    ema: EmotionScores,
    alpha: f32,
    idle_decay: f32,
}

impl ScoreSmoother {
    pub fn new(alpha: f32, idle_decay: f32) -> Self {
        Self {
            ema: EmotionScores::default(),
            alpha,
            idle_decay,
        }
    }

    /// Blend one adjusted score vector into the running average.
    pub fn update(&mut self, adjusted: &EmotionScores) {
        for emotion in Emotion::ALL {
            let blended = self.alpha * adjusted.get(emotion).sqrt()
                + (1.0 - self.alpha) * self.ema.get(emotion);
            self.ema.set(emotion, blended);
        }
    }

    /// Let the average drain while no face is observed.
    pub fn decay(&mut self) {
        for emotion in Emotion::ALL {
            self.ema.set(emotion, self.ema.get(emotion) * self.idle_decay);
        }
    }

    pub fn scores(&self) -> &EmotionScores {
        &self.ema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_follows_compressed_blend() {
        let mut smoother = ScoreSmoother::new(0.3, 0.9);
        smoother.update(&EmotionScores::one_hot(Emotion::Happy));

        // 0.3 * sqrt(1.0) + 0.7 * 0.0
        assert!((smoother.scores().get(Emotion::Happy) - 0.3).abs() < 1e-6);

        smoother.update(&EmotionScores::one_hot(Emotion::Happy));
        // 0.3 + 0.7 * 0.3
        assert!((smoother.scores().get(Emotion::Happy) - 0.51).abs() < 1e-6);
    }

    #[test]
    fn test_sqrt_compression_boosts_small_scores() {
        let mut adjusted = EmotionScores::default();
        adjusted.set(Emotion::Surprise, 0.04);

        let mut smoother = ScoreSmoother::new(0.3, 0.9);
        smoother.update(&adjusted);

        // sqrt(0.04) = 0.2, five times the linear contribution
        assert!((smoother.scores().get(Emotion::Surprise) - 0.06).abs() < 1e-6);
    }

    #[test]
    fn test_decay_drains_all_categories() {
        let mut smoother = ScoreSmoother::new(0.3, 0.9);
        smoother.update(&EmotionScores::one_hot(Emotion::Angry));
        let before = smoother.scores().get(Emotion::Angry);

        smoother.decay();
        assert!((smoother.scores().get(Emotion::Angry) - before * 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_converges_toward_compressed_value() {
        let mut adjusted = EmotionScores::default();
        adjusted.set(Emotion::Fear, 0.25);

        let mut smoother = ScoreSmoother::new(0.3, 0.9);
        for _ in 0..100 {
            smoother.update(&adjusted);
        }
        // Fixed point is sqrt(0.25) = 0.5
        assert!((smoother.scores().get(Emotion::Fear) - 0.5).abs() < 1e-3);
    }
}
