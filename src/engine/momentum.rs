//! Inner-state momentum integrator.
//!
//! Tracks the debounced output label, not the raw resolved one, so a pending
//! candidacy does not leak into the scalar. Stress accrues roughly 2.5x
//! faster than calm rebuilds.

use crate::types::Emotion;

/// Gain per frame for calm-building labels.
const RECOVERY_RATE: f32 = 0.02;
/// Happy and surprise rebuild calm twice as fast as passive neutral.
const RECOVERY_BOOST: f32 = 2.0;
/// Drain per frame for negative labels.
const STRESS_RATE: f32 = 0.05;

/// Continuous calm/stress scalar in [0.0, 1.0].
#[derive(Debug)]
pub struct InnerState {
    value: f32,
}

impl InnerState {
    pub fn new(initial: f32) -> Self {
        Self {
            value: initial.clamp(0.0, 1.0),
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Apply one frame's output label with its confidence. Returns the new
    /// value, clamped on every update.
    pub fn apply(&mut self, label: Emotion, confidence: f32) -> f32 {
        let delta = match label {
            Emotion::Happy | Emotion::Surprise => RECOVERY_RATE * RECOVERY_BOOST * confidence,
            Emotion::Neutral => RECOVERY_RATE * confidence,
            Emotion::Angry | Emotion::Sad | Emotion::Fear | Emotion::Disgust => {
                -STRESS_RATE * confidence
            }
        };
        self.value = (self.value + delta).clamp(0.0, 1.0);
        self.value
    }
}

impl Default for InnerState {
    fn default() -> Self {
        Self::new(0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_recovers_slowly() {
        let mut state = InnerState::new(0.5);
        state.apply(Emotion::Neutral, 1.0);
        assert!((state.value() - 0.52).abs() < 1e-6);
    }

    #[test]
    fn test_happy_and_surprise_recover_twice_as_fast() {
        let mut happy = InnerState::new(0.5);
        happy.apply(Emotion::Happy, 1.0);
        assert!((happy.value() - 0.54).abs() < 1e-6);

        let mut surprise = InnerState::new(0.5);
        surprise.apply(Emotion::Surprise, 0.5);
        assert!((surprise.value() - 0.52).abs() < 1e-6);
    }

    #[test]
    fn test_negative_labels_drain_faster() {
        let mut state = InnerState::new(0.5);
        state.apply(Emotion::Angry, 0.6);
        assert!((state.value() - 0.47).abs() < 1e-6);

        state.apply(Emotion::Sad, 1.0);
        assert!((state.value() - 0.42).abs() < 1e-6);
    }

    #[test]
    fn test_clamped_at_both_ends() {
        let mut state = InnerState::new(0.99);
        for _ in 0..100 {
            state.apply(Emotion::Happy, 1.0);
        }
        assert_eq!(state.value(), 1.0);

        for _ in 0..100 {
            state.apply(Emotion::Fear, 1.0);
        }
        assert_eq!(state.value(), 0.0);

        // Absurd confidence still cannot escape the range
        state.apply(Emotion::Happy, 1e6);
        assert_eq!(state.value(), 1.0);
        state.apply(Emotion::Angry, 1e6);
        assert_eq!(state.value(), 0.0);
    }

    #[test]
    fn test_initial_value_is_clamped() {
        assert_eq!(InnerState::new(7.0).value(), 1.0);
        assert_eq!(InnerState::new(-3.0).value(), 0.0);
    }
}
