//! Core data types shared across the pipeline.

use serde::{Deserialize, Serialize};

/// Number of emotion categories the classifier scores.
pub const EMOTION_COUNT: usize = 7;

/// The fixed emotion category set, in classifier output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
}

impl Emotion {
    /// All categories in canonical order.
    pub const ALL: [Emotion; EMOTION_COUNT] = [
        Emotion::Angry,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Surprise,
        Emotion::Neutral,
    ];

    /// Wire name of the category (lowercase, matches the serde rename)
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Angry => "angry",
            Emotion::Disgust => "disgust",
            Emotion::Fear => "fear",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Surprise => "surprise",
            Emotion::Neutral => "neutral",
        }
    }

    fn index(&self) -> usize {
        match self {
            Emotion::Angry => 0,
            Emotion::Disgust => 1,
            Emotion::Fear => 2,
            Emotion::Happy => 3,
            Emotion::Sad => 4,
            Emotion::Surprise => 5,
            Emotion::Neutral => 6,
        }
    }
}

/// Per-category score vector over the fixed emotion set.
///
/// Raw classifier output carries no invariant; after `normalized()` the
/// entries are non-negative and sum to 1.0 (or are all zero if the input
/// had no mass).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EmotionScores([f32; EMOTION_COUNT]);

impl EmotionScores {
    pub fn get(&self, emotion: Emotion) -> f32 {
        self.0[emotion.index()]
    }

    pub fn set(&mut self, emotion: Emotion, value: f32) {
        self.0[emotion.index()] = value;
    }

    /// A vector with all mass on a single category.
    pub fn one_hot(emotion: Emotion) -> Self {
        let mut scores = Self::default();
        scores.set(emotion, 1.0);
        scores
    }

    pub fn sum(&self) -> f32 {
        self.0.iter().sum()
    }

    /// Rescale so the entries sum to 1.0. A vector with no mass stays all
    /// zero rather than dividing by zero.
    pub fn normalized(&self) -> Self {
        let total = self.sum();
        if total > 0.0 {
            let mut scores = *self;
            for value in &mut scores.0 {
                *value /= total;
            }
            scores
        } else {
            Self::default()
        }
    }

    /// The two strongest categories, ties broken by canonical order.
    pub fn top_two(&self) -> ((Emotion, f32), (Emotion, f32)) {
        let mut best = (Emotion::Angry, f32::MIN);
        let mut second = (Emotion::Angry, f32::MIN);
        for emotion in Emotion::ALL {
            let value = self.get(emotion);
            if value > best.1 {
                second = best;
                best = (emotion, value);
            } else if value > second.1 {
                second = (emotion, value);
            }
        }
        (best, second)
    }

    pub fn entries(&self) -> impl Iterator<Item = (Emotion, f32)> + '_ {
        Emotion::ALL.iter().map(move |&e| (e, self.get(e)))
    }
}

/// Session lifecycle as observed by the publisher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Initializing,
    Calibrating { collected: usize, needed: usize },
    Active,
    Error(String),
}

impl SessionStatus {
    /// Status string sent to transport clients.
    pub fn as_wire(&self) -> String {
        match self {
            SessionStatus::Initializing => "initializing".to_string(),
            SessionStatus::Calibrating { collected, needed } => {
                format!("calibrating ({}/{})", collected, needed)
            }
            SessionStatus::Active => "active".to_string(),
            SessionStatus::Error(reason) => format!("error: {}", reason),
        }
    }
}

/// The externally visible state of the session.
///
/// Written only by the engine thread; read by the transport. `intensity` is
/// the resolver confidence of the last processed frame, as a percentage.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSnapshot {
    pub emotion: Emotion,
    pub inner_state: f32,
    pub intensity: f32,
    pub status: SessionStatus,
}

impl Default for StateSnapshot {
    fn default() -> Self {
        Self {
            emotion: Emotion::Neutral,
            inner_state: 0.5,
            intensity: 0.0,
            status: SessionStatus::Initializing,
        }
    }
}

/// Wire message pushed to WebSocket clients on the publish cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateUpdate {
    pub emotion: String,
    pub inner_state: f32,
    pub intensity: f32,
    pub status: String,
}

impl StateUpdate {
    pub fn from_snapshot(snapshot: &StateSnapshot) -> Self {
        Self {
            emotion: snapshot.emotion.as_str().to_string(),
            inner_state: snapshot.inner_state,
            intensity: snapshot.intensity,
            status: snapshot.status.as_wire(),
        }
    }
}
