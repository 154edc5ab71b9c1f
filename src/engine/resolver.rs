//! Label resolution: confusion handling, hysteresis, confidence threshold.
//!
//! Works on a per-frame copy of the smoothed scores; the smoother's state is
//! never written from here.

use crate::types::{Emotion, EmotionScores};

/// A disambiguation rule for two easily-confused categories.
///
/// When `pair` are the two strongest categories and their scores sit within
/// `max_gap` of each other, a strong `corroborator` reading tips the balance
/// toward `beneficiary`.
#[derive(Debug, Clone)]
pub struct ConfusionRule {
    pub pair: (Emotion, Emotion),
    pub max_gap: f32,
    pub corroborator: Emotion,
    pub corroborator_floor: f32,
    pub beneficiary: Emotion,
    pub boost: f32,
}

impl ConfusionRule {
    fn applies_to(&self, top: Emotion, second: Emotion) -> bool {
        (top, second) == self.pair || (second, top) == self.pair
    }
}

/// The classifier confuses anger and fear on most faces; surprise co-occurring
/// suggests fear, disgust co-occurring suggests anger.
fn default_rules() -> Vec<ConfusionRule> {
    vec![
        ConfusionRule {
            pair: (Emotion::Angry, Emotion::Fear),
            max_gap: 0.15,
            corroborator: Emotion::Surprise,
            corroborator_floor: 0.10,
            beneficiary: Emotion::Fear,
            boost: 0.20,
        },
        ConfusionRule {
            pair: (Emotion::Angry, Emotion::Fear),
            max_gap: 0.15,
            corroborator: Emotion::Disgust,
            corroborator_floor: 0.10,
            beneficiary: Emotion::Angry,
            boost: 0.20,
        },
    ]
}

/// Result of resolving one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedLabel {
    pub label: Emotion,
    /// Top score before the neutral threshold was applied.
    pub confidence: f32,
}

/// Resolves the smoothed scores into a single label per frame.
pub struct LabelResolver {
    rules: Vec<ConfusionRule>,
    /// Pairs that must overcome the hysteresis ratio to displace each other.
    sticky_pairs: Vec<(Emotion, Emotion)>,
    hysteresis_ratio: f32,
    min_confidence: f32,
}

impl LabelResolver {
    pub fn new(min_confidence: f32, hysteresis_ratio: f32) -> Self {
        Self {
            rules: default_rules(),
            sticky_pairs: vec![(Emotion::Angry, Emotion::Fear)],
            hysteresis_ratio,
            min_confidence,
        }
    }

    fn is_sticky(&self, a: Emotion, b: Emotion) -> bool {
        self.sticky_pairs
            .iter()
            .any(|&(x, y)| (a, b) == (x, y) || (a, b) == (y, x))
    }

    /// Resolve one frame given the current smoothed scores and the label the
    /// commit machine currently exposes.
    pub fn resolve(&self, smoothed: &EmotionScores, committed: Emotion) -> ResolvedLabel {
        let mut working = *smoothed;
        let ((top, top_score), (second, second_score)) = working.top_two();

        // Additive boosts for confusable pairs, judged on the pre-boost ranking
        for rule in &self.rules {
            if rule.applies_to(top, second)
                && (top_score - second_score).abs() < rule.max_gap
                && working.get(rule.corroborator) > rule.corroborator_floor
            {
                working.set(rule.beneficiary, working.get(rule.beneficiary) + rule.boost);
            }
        }

        let ((mut top, mut top_score), _) = working.top_two();

        // Hysteresis: within a sticky pair the challenger must beat the
        // incumbent by the configured ratio, not just edge past it.
        if top != committed && self.is_sticky(top, committed) {
            let incumbent_score = working.get(committed);
            if top_score < incumbent_score * self.hysteresis_ratio {
                top = committed;
                top_score = incumbent_score;
            }
        }

        let label = if top_score < self.min_confidence {
            Emotion::Neutral
        } else {
            top
        };

        ResolvedLabel {
            label,
            confidence: top_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> LabelResolver {
        LabelResolver::new(0.40, 1.20)
    }

    fn scores(entries: &[(Emotion, f32)]) -> EmotionScores {
        let mut s = EmotionScores::default();
        for &(e, v) in entries {
            s.set(e, v);
        }
        s
    }

    #[test]
    fn test_clear_winner_above_threshold() {
        let s = scores(&[(Emotion::Happy, 0.7), (Emotion::Neutral, 0.2)]);
        let resolved = resolver().resolve(&s, Emotion::Neutral);
        assert_eq!(resolved.label, Emotion::Happy);
        assert!((resolved.confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_below_threshold_falls_back_to_neutral() {
        let s = scores(&[(Emotion::Sad, 0.35), (Emotion::Fear, 0.1)]);
        let resolved = resolver().resolve(&s, Emotion::Neutral);
        assert_eq!(resolved.label, Emotion::Neutral);
        // Confidence stays the pre-threshold top score
        assert!((resolved.confidence - 0.35).abs() < 1e-6);
    }

    #[test]
    fn test_surprise_tips_angry_fear_tie_toward_fear() {
        let s = scores(&[
            (Emotion::Angry, 0.5),
            (Emotion::Fear, 0.45),
            (Emotion::Surprise, 0.15),
        ]);
        let resolved = resolver().resolve(&s, Emotion::Neutral);
        assert_eq!(resolved.label, Emotion::Fear);
        assert!((resolved.confidence - 0.65).abs() < 1e-6);
    }

    #[test]
    fn test_disgust_tips_angry_fear_tie_toward_angry() {
        let s = scores(&[
            (Emotion::Fear, 0.5),
            (Emotion::Angry, 0.45),
            (Emotion::Disgust, 0.12),
        ]);
        let resolved = resolver().resolve(&s, Emotion::Neutral);
        assert_eq!(resolved.label, Emotion::Angry);
        assert!((resolved.confidence - 0.65).abs() < 1e-6);
    }

    #[test]
    fn test_no_boost_outside_gap() {
        let s = scores(&[
            (Emotion::Angry, 0.6),
            (Emotion::Fear, 0.2),
            (Emotion::Surprise, 0.15),
        ]);
        let resolved = resolver().resolve(&s, Emotion::Neutral);
        assert_eq!(resolved.label, Emotion::Angry);
        assert!((resolved.confidence - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_no_boost_without_corroborator() {
        let s = scores(&[(Emotion::Angry, 0.5), (Emotion::Fear, 0.45)]);
        let resolved = resolver().resolve(&s, Emotion::Neutral);
        assert_eq!(resolved.label, Emotion::Angry);
    }

    #[test]
    fn test_hysteresis_blocks_marginal_challenger() {
        // Committed fear; angry only 10% ahead must not dislodge it
        let s = scores(&[(Emotion::Angry, 0.55), (Emotion::Fear, 0.5)]);
        let resolved = resolver().resolve(&s, Emotion::Fear);
        assert_eq!(resolved.label, Emotion::Fear);
        assert!((resolved.confidence - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_hysteresis_admits_strong_challenger() {
        // 20% and above is eligible
        let s = scores(&[(Emotion::Angry, 0.61), (Emotion::Fear, 0.5)]);
        let resolved = resolver().resolve(&s, Emotion::Fear);
        assert_eq!(resolved.label, Emotion::Angry);
        assert!((resolved.confidence - 0.61).abs() < 1e-6);
    }

    #[test]
    fn test_hysteresis_only_binds_sticky_pair() {
        // Committed happy is not sticky against angry
        let s = scores(&[(Emotion::Angry, 0.55), (Emotion::Happy, 0.5)]);
        let resolved = resolver().resolve(&s, Emotion::Happy);
        assert_eq!(resolved.label, Emotion::Angry);
    }

    #[test]
    fn test_resolver_does_not_mutate_input() {
        let s = scores(&[
            (Emotion::Angry, 0.5),
            (Emotion::Fear, 0.45),
            (Emotion::Surprise, 0.15),
        ]);
        let before = s;
        let _ = resolver().resolve(&s, Emotion::Neutral);
        assert_eq!(s, before);
    }
}
