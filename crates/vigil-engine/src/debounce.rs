//! Debounce state machine.
//!
//! Turns the smoothed per-frame decision of one class into
//! `Idle -> Armed -> Alert -> Idle` transitions.
//!
//! | State | smoothed | Next |
//! |-------|----------|------|
//! | `Idle` | true | `Armed`, `consecutive_true = 1` (or `Alert` if raise is 1) |
//! | `Idle` | false | `Idle` |
//! | `Armed` | true | `consecutive_true += 1`; `Alert` once it reaches raise |
//! | `Armed` | false | `Idle`, counters reset |
//! | `Alert` | true | stay, `consecutive_false = 0`, `consecutive_true` unchanged |
//! | `Alert` | false | `consecutive_false += 1`; `Idle` once it reaches clear |
//!
//! Raising needs an unbroken run of `consecutive_frames_to_raise` present
//! frames. Clearing needs an unbroken run of `consecutive_frames_to_clear`
//! absent frames, so short gaps inside an alert do not flap the banner.
//! Whenever one counter advances the other is zeroed, so at most one of the
//! two is ever nonzero.

use vigil_models::{AlertState, DebounceState, TransitionKind};

use crate::config::ClassConfig;

/// Raise/clear thresholds for one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceThresholds {
    pub raise: u32,
    pub clear: u32,
}

impl From<&ClassConfig> for DebounceThresholds {
    fn from(config: &ClassConfig) -> Self {
        Self {
            raise: config.consecutive_frames_to_raise,
            clear: config.consecutive_frames_to_clear,
        }
    }
}

/// Pure transition function.
///
/// Returns the next state and the alert edge crossed on this frame, if any.
pub fn transition(
    current: DebounceState,
    smoothed: bool,
    thresholds: DebounceThresholds,
) -> (DebounceState, Option<TransitionKind>) {
    match (current.state, smoothed) {
        (AlertState::Idle, false) => (DebounceState::default(), None),

        (AlertState::Idle, true) | (AlertState::Armed, true) => {
            let streak = current.consecutive_true.saturating_add(1);
            if streak >= thresholds.raise {
                (
                    DebounceState {
                        state: AlertState::Alert,
                        consecutive_true: streak,
                        consecutive_false: 0,
                    },
                    Some(TransitionKind::Raised),
                )
            } else {
                (
                    DebounceState {
                        state: AlertState::Armed,
                        consecutive_true: streak,
                        consecutive_false: 0,
                    },
                    None,
                )
            }
        }

        (AlertState::Armed, false) => (DebounceState::default(), None),

        (AlertState::Alert, true) => (
            DebounceState {
                state: AlertState::Alert,
                consecutive_true: current.consecutive_true,
                consecutive_false: 0,
            },
            None,
        ),

        (AlertState::Alert, false) => {
            let streak = current.consecutive_false.saturating_add(1);
            if streak >= thresholds.clear {
                (DebounceState::default(), Some(TransitionKind::Cleared))
            } else {
                (
                    DebounceState {
                        state: AlertState::Alert,
                        consecutive_true: 0,
                        consecutive_false: streak,
                    },
                    None,
                )
            }
        }
    }
}

/// Debounce state holder for one class.
#[derive(Debug, Clone)]
pub struct Debouncer {
    state: DebounceState,
    thresholds: DebounceThresholds,
}

impl Debouncer {
    pub fn new(thresholds: DebounceThresholds) -> Self {
        Self {
            state: DebounceState::default(),
            thresholds,
        }
    }

    /// Advance by one frame.
    pub fn step(&mut self, smoothed: bool) -> Option<TransitionKind> {
        let (next, edge) = transition(self.state, smoothed, self.thresholds);
        self.state = next;
        edge
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    pub fn is_alert(&self) -> bool {
        self.state.is_alert()
    }

    pub fn thresholds(&self) -> DebounceThresholds {
        self.thresholds
    }

    pub fn reset(&mut self) {
        self.state = DebounceState::default();
    }
}
