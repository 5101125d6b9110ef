//! Per-class debounce state snapshots.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ViolationClass;

/// Debounce phase of a single violation class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum AlertState {
    /// No violation signal.
    #[default]
    Idle,
    /// Violation signal seen, below the raise threshold.
    Armed,
    /// Violation active and surfaced.
    Alert,
}

impl AlertState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertState::Idle => "idle",
            AlertState::Armed => "armed",
            AlertState::Alert => "alert",
        }
    }
}

impl std::fmt::Display for AlertState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a class's debounce state.
///
/// At most one of `consecutive_true` / `consecutive_false` is nonzero.
/// While in `Alert`, a nonzero `consecutive_false` is the cooldown
/// progress toward clearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub struct DebounceState {
    pub state: AlertState,
    pub consecutive_true: u32,
    pub consecutive_false: u32,
}

impl DebounceState {
    pub fn is_alert(&self) -> bool {
        self.state == AlertState::Alert
    }

    pub fn is_idle(&self) -> bool {
        *self == DebounceState::default()
    }

    /// True while in `Alert` with a clearing streak in progress.
    pub fn is_cooling_down(&self) -> bool {
        self.is_alert() && self.consecutive_false > 0
    }
}

/// Edge emitted when a class enters or leaves `Alert`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    /// Alert episode started.
    Raised,
    /// Alert episode ended.
    Cleared,
}

/// Alert edge for one class in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct AlertTransition {
    pub class: ViolationClass,
    pub kind: TransitionKind,
}
