//! Session-level alert accounting types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cumulative alert totals for one class.
///
/// All counters are non-decreasing within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub struct LedgerEntry {
    /// Frames spent in `Alert`.
    pub total_alert_frames: u64,
    /// Frames in `Alert` times the frame interval.
    pub total_alert_duration: Duration,
    /// Number of distinct alert episodes.
    pub alert_episodes: u64,
}

impl LedgerEntry {
    pub fn is_zero(&self) -> bool {
        *self == LedgerEntry::default()
    }

    /// Average episode length, if any episode occurred.
    pub fn mean_episode_duration(&self) -> Option<Duration> {
        if self.alert_episodes == 0 {
            return None;
        }
        let episodes = u32::try_from(self.alert_episodes).unwrap_or(u32::MAX);
        Some(self.total_alert_duration / episodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_entry_is_zero() {
        assert!(LedgerEntry::default().is_zero());
        assert_eq!(LedgerEntry::default().mean_episode_duration(), None);
    }

    #[test]
    fn test_mean_episode_duration() {
        let entry = LedgerEntry {
            total_alert_frames: 90,
            total_alert_duration: Duration::from_secs(3),
            alert_episodes: 2,
        };
        assert_eq!(entry.mean_episode_duration(), Some(Duration::from_millis(1500)));
    }
}
