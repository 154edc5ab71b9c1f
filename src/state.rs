//! Shared session state.
//!
//! An explicitly owned handle instead of a process-wide global: the engine
//! thread is the only writer, the transport reads. The lock is held just long
//! enough to copy the snapshot.

use std::sync::{Arc, RwLock};

use crate::types::{Emotion, SessionStatus, StateSnapshot};

/// Cloneable handle to the current session snapshot.
#[derive(Clone)]
pub struct SharedState {
    inner: Arc<RwLock<StateSnapshot>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(StateSnapshot::default())),
        }
    }

    /// Copy of the current snapshot.
    pub fn snapshot(&self) -> StateSnapshot {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn set_status(&self, status: SessionStatus) {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.status = status;
    }

    /// Publish one processed frame's results. Status is untouched.
    pub fn publish(&self, emotion: Emotion, inner_state: f32, intensity: f32) {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.emotion = emotion;
        guard.inner_state = inner_state;
        guard.intensity = intensity;
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_initializing() {
        let state = SharedState::new();
        let snapshot = state.snapshot();
        assert_eq!(snapshot.status, SessionStatus::Initializing);
        assert_eq!(snapshot.emotion, Emotion::Neutral);
        assert_eq!(snapshot.inner_state, 0.5);
    }

    #[test]
    fn test_publish_preserves_status() {
        let state = SharedState::new();
        state.set_status(SessionStatus::Active);
        state.publish(Emotion::Happy, 0.7, 55.0);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.status, SessionStatus::Active);
        assert_eq!(snapshot.emotion, Emotion::Happy);
        assert_eq!(snapshot.intensity, 55.0);
    }

    #[test]
    fn test_clones_share_state() {
        let state = SharedState::new();
        let reader = state.clone();
        state.publish(Emotion::Sad, 0.2, 40.0);
        assert_eq!(reader.snapshot().emotion, Emotion::Sad);
    }
}
