//! Per-frame input metadata and evaluation output.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use crate::{AlertTransition, DebounceState, TransitionKind, ViolationClass};

/// Identity of a frame in the evaluated stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub struct FrameInfo {
    /// Sequence number assigned by the frame source.
    pub index: u64,
    /// Capture time relative to the start of the stream.
    pub timestamp: Duration,
}

impl FrameInfo {
    pub fn new(index: u64, timestamp: Duration) -> Self {
        Self { index, timestamp }
    }

    /// Frame info for a fixed-rate stream.
    pub fn at_interval(index: u64, interval: Duration) -> Self {
        let steps = u32::try_from(index).unwrap_or(u32::MAX);
        Self {
            index,
            timestamp: interval * steps,
        }
    }
}

/// Result of evaluating one frame. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FrameResult {
    pub frame_index: u64,
    pub timestamp: Duration,
    /// Classes currently in `Alert`, in class order.
    pub active_alerts: BTreeSet<ViolationClass>,
    /// Debounce state of every configured class after this frame.
    pub per_class_state: BTreeMap<ViolationClass, DebounceState>,
    /// Alert edges that happened on this frame.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transitions: Vec<AlertTransition>,
}

impl FrameResult {
    pub fn is_alerting(&self, class: ViolationClass) -> bool {
        self.active_alerts.contains(&class)
    }

    pub fn has_alerts(&self) -> bool {
        !self.active_alerts.is_empty()
    }

    pub fn state_of(&self, class: ViolationClass) -> Option<&DebounceState> {
        self.per_class_state.get(&class)
    }

    /// Classes whose alert started on this frame.
    pub fn raised(&self) -> impl Iterator<Item = ViolationClass> + '_ {
        self.transitions
            .iter()
            .filter(|t| t.kind == TransitionKind::Raised)
            .map(|t| t.class)
    }

    /// Classes whose alert ended on this frame.
    pub fn cleared(&self) -> impl Iterator<Item = ViolationClass> + '_ {
        self.transitions
            .iter()
            .filter(|t| t.kind == TransitionKind::Cleared)
            .map(|t| t.class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AlertState;

    fn sample_result() -> FrameResult {
        let mut per_class_state = BTreeMap::new();
        per_class_state.insert(
            ViolationClass::PhoneUse,
            DebounceState {
                state: AlertState::Alert,
                consecutive_true: 3,
                consecutive_false: 0,
            },
        );
        per_class_state.insert(ViolationClass::Smoking, DebounceState::default());

        FrameResult {
            frame_index: 7,
            timestamp: Duration::from_millis(233),
            active_alerts: [ViolationClass::PhoneUse].into_iter().collect(),
            per_class_state,
            transitions: vec![AlertTransition {
                class: ViolationClass::PhoneUse,
                kind: TransitionKind::Raised,
            }],
        }
    }

    #[test]
    fn test_frame_result_queries() {
        let result = sample_result();
        assert!(result.has_alerts());
        assert!(result.is_alerting(ViolationClass::PhoneUse));
        assert!(!result.is_alerting(ViolationClass::Smoking));
        assert_eq!(result.raised().collect::<Vec<_>>(), vec![ViolationClass::PhoneUse]);
        assert_eq!(result.cleared().count(), 0);
        assert!(result.state_of(ViolationClass::Sleeping).is_none());
    }

    #[test]
    fn test_frame_result_json_uses_class_keys() {
        let json = serde_json::to_value(sample_result()).unwrap();
        assert_eq!(json["active_alerts"][0], "phone_use");
        assert_eq!(json["per_class_state"]["phone_use"]["state"], "alert");
        assert_eq!(json["per_class_state"]["smoking"]["state"], "idle");
    }

    #[test]
    fn test_frame_info_at_interval() {
        let info = FrameInfo::at_interval(30, Duration::from_millis(33));
        assert_eq!(info.timestamp, Duration::from_millis(990));
    }
}
