//! Label commit state machine.
//!
//! The externally visible label only changes after the same challenger has
//! been the resolved label continuously for the hold duration. A single noisy
//! frame can never flip the output; this is the anti-flicker guarantee the
//! rest of the pipeline leans on.

use tracing::debug;

use crate::types::Emotion;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Stable,
    Pending { candidate: Emotion, since_ms: u64 },
}

/// Debounces resolved labels into a committed one.
#[derive(Debug)]
pub struct LabelDebouncer {
    committed: Emotion,
    phase: Phase,
    hold_ms: u64,
}

impl LabelDebouncer {
    pub fn new(hold_ms: u64) -> Self {
        Self {
            committed: Emotion::Neutral,
            phase: Phase::Stable,
            hold_ms,
        }
    }

    /// The currently committed label.
    pub fn committed(&self) -> Emotion {
        self.committed
    }

    /// Feed one resolved label at `now_ms`; returns the label to expose for
    /// this frame.
    pub fn observe(&mut self, resolved: Emotion, now_ms: u64) -> Emotion {
        if resolved == self.committed {
            self.phase = Phase::Stable;
            return self.committed;
        }

        match self.phase {
            Phase::Pending { candidate, since_ms } if candidate == resolved => {
                if now_ms.saturating_sub(since_ms) >= self.hold_ms {
                    debug!(
                        "Committing {} after {}ms of sustained evidence",
                        resolved.as_str(),
                        now_ms.saturating_sub(since_ms)
                    );
                    self.committed = resolved;
                    self.phase = Phase::Stable;
                }
                self.committed
            }
            _ => {
                self.phase = Phase::Pending {
                    candidate: resolved,
                    since_ms: now_ms,
                };
                self.committed
            }
        }
    }
}
