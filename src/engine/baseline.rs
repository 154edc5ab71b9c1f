//! Baseline removal.
//!
//! Subtracting the rest vector strips the user's idle expression (naturally
//! low brows read as "angry", for example) before any smoothing or decision
//! logic runs.

use crate::types::{Emotion, EmotionScores};

/// Subtract the resting baseline from a normalized score vector and rescale
/// back onto the probability simplex. When the baseline swallows everything,
/// the frame carries no signal beyond the resting face, so all mass goes to
/// neutral.
pub fn remove_baseline(raw: &EmotionScores, rest: &EmotionScores) -> EmotionScores {
    let mut adjusted = EmotionScores::default();
    for emotion in Emotion::ALL {
        adjusted.set(emotion, (raw.get(emotion) - rest.get(emotion)).max(0.0));
    }

    if adjusted.sum() > 0.0 {
        adjusted.normalized()
    } else {
        EmotionScores::one_hot(Emotion::Neutral)
    }
}
