//! Monitor lifecycle status.

use serde::Serialize;
use std::fmt;

/// Published over a `watch` channel so UIs always see the latest state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum MonitorStatus {
    #[default]
    Starting,
    Running,
    Paused,
    /// Source lost; reconnect attempt in progress
    Disconnected { attempt: u32 },
    Finished,
}

impl MonitorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MonitorStatus::Starting => "starting",
            MonitorStatus::Running => "running",
            MonitorStatus::Paused => "paused",
            MonitorStatus::Disconnected { .. } => "disconnected",
            MonitorStatus::Finished => "finished",
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, MonitorStatus::Finished)
    }
}

impl fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorStatus::Disconnected { attempt } => write!(f, "disconnected (attempt {})", attempt),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(MonitorStatus::Running.to_string(), "running");
        assert_eq!(
            MonitorStatus::Disconnected { attempt: 2 }.to_string(),
            "disconnected (attempt 2)"
        );
    }

    #[test]
    fn test_serialize_tagged() {
        let json = serde_json::to_value(MonitorStatus::Disconnected { attempt: 1 }).unwrap();
        assert_eq!(json["status"], "disconnected");
        assert_eq!(json["attempt"], 1);
        assert!(MonitorStatus::Finished.is_finished());
    }
}
