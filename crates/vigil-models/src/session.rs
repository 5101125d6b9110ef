//! Monitoring session identity and statistics.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Unique identifier for a monitoring session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Frame-level statistics for the current session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SessionStats {
    pub session_id: SessionId,
    pub started_at: DateTime<Utc>,
    /// Frames passed through `evaluate`.
    pub frames_evaluated: u64,
    /// Frames with at least one active alert.
    pub frames_with_alerts: u64,
    /// Frames evaluated times the frame interval.
    pub evaluated_duration: Duration,
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            session_id: SessionId::new(),
            started_at: Utc::now(),
            frames_evaluated: 0,
            frames_with_alerts: 0,
            evaluated_duration: Duration::ZERO,
        }
    }

    /// Share of evaluated frames with any alert active, in [0, 1].
    pub fn alert_ratio(&self) -> f64 {
        if self.frames_evaluated == 0 {
            return 0.0;
        }
        self.frames_with_alerts as f64 / self.frames_evaluated as f64
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
        assert_eq!(SessionId::from_string("s-1").as_str(), "s-1");
    }

    #[test]
    fn test_alert_ratio() {
        let mut stats = SessionStats::new();
        assert_eq!(stats.alert_ratio(), 0.0);

        stats.frames_evaluated = 40;
        stats.frames_with_alerts = 10;
        assert!((stats.alert_ratio() - 0.25).abs() < f64::EPSILON);
    }
}
