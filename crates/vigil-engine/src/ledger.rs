//! Session ledger: per-class alert totals.

use std::collections::BTreeMap;
use std::time::Duration;

use vigil_models::{LedgerEntry, ViolationClass};

/// Cumulative alert accounting for the configured classes.
///
/// Only the engine mutates the ledger; consumers get owned snapshots.
#[derive(Debug, Clone)]
pub struct SessionLedger {
    entries: BTreeMap<ViolationClass, LedgerEntry>,
    frame_interval: Duration,
}

impl SessionLedger {
    pub fn new(classes: impl IntoIterator<Item = ViolationClass>, frame_interval: Duration) -> Self {
        Self {
            entries: classes
                .into_iter()
                .map(|class| (class, LedgerEntry::default()))
                .collect(),
            frame_interval,
        }
    }

    /// Count the start of an alert episode.
    pub fn record_episode_start(&mut self, class: ViolationClass) {
        if let Some(entry) = self.entries.get_mut(&class) {
            entry.alert_episodes = entry.alert_episodes.saturating_add(1);
        }
    }

    /// Count one frame spent in `Alert`.
    pub fn record_alert_frame(&mut self, class: ViolationClass) {
        if let Some(entry) = self.entries.get_mut(&class) {
            entry.total_alert_frames = entry.total_alert_frames.saturating_add(1);
            entry.total_alert_duration = entry
                .total_alert_duration
                .saturating_add(self.frame_interval);
        }
    }

    pub fn entry(&self, class: ViolationClass) -> Option<LedgerEntry> {
        self.entries.get(&class).copied()
    }

    pub fn snapshot(&self) -> BTreeMap<ViolationClass, LedgerEntry> {
        self.entries.clone()
    }

    /// Zero every entry. Only for explicit session boundaries.
    pub fn reset(&mut self) {
        for entry in self.entries.values_mut() {
            *entry = LedgerEntry::default();
        }
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> SessionLedger {
        SessionLedger::new(
            [ViolationClass::Sleeping, ViolationClass::PhoneUse],
            Duration::from_millis(40),
        )
    }

    #[test]
    fn test_new_ledger_is_zeroed() {
        let snapshot = ledger().snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.values().all(LedgerEntry::is_zero));
    }

    #[test]
    fn test_alert_frames_accumulate_duration() {
        let mut ledger = ledger();
        ledger.record_episode_start(ViolationClass::PhoneUse);
        for _ in 0..25 {
            ledger.record_alert_frame(ViolationClass::PhoneUse);
        }

        let entry = ledger.entry(ViolationClass::PhoneUse).unwrap();
        assert_eq!(entry.alert_episodes, 1);
        assert_eq!(entry.total_alert_frames, 25);
        assert_eq!(entry.total_alert_duration, Duration::from_secs(1));
        assert!(ledger.entry(ViolationClass::Sleeping).unwrap().is_zero());
    }

    #[test]
    fn test_unknown_class_is_ignored() {
        let mut ledger = ledger();
        ledger.record_alert_frame(ViolationClass::Smoking);
        assert!(ledger.entry(ViolationClass::Smoking).is_none());
        assert_eq!(ledger.snapshot().len(), 2);
    }

    #[test]
    fn test_reset_zeroes_entries() {
        let mut ledger = ledger();
        ledger.record_episode_start(ViolationClass::Sleeping);
        ledger.record_alert_frame(ViolationClass::Sleeping);
        ledger.reset();

        assert!(ledger.snapshot().values().all(LedgerEntry::is_zero));
        assert_eq!(ledger.frame_interval(), Duration::from_millis(40));
    }
}
