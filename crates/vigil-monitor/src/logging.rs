//! Structured session logging utilities.
//!
//! Provides consistent, structured logging for monitoring sessions with
//! tracing spans and contextual information.

use std::time::Duration;
use tracing::{info, warn, Span};
use vigil_models::{SessionId, ViolationClass};

use crate::pipeline::SessionSummary;

/// Session logger for structured logging with consistent formatting.
///
/// Every event carries the session ID and the frame source name.
#[derive(Debug, Clone)]
pub struct SessionLogger {
    session_id: String,
    source: String,
}

impl SessionLogger {
    /// Create a new session logger for a session and frame source.
    pub fn new(session_id: &SessionId, source: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            source: source.to_string(),
        }
    }

    pub fn log_start(&self, classes: usize, detectors: usize) {
        info!(
            session_id = %self.session_id,
            source = %self.source,
            classes,
            detectors,
            "Monitoring session started"
        );
    }

    pub fn log_alert_raised(&self, class: ViolationClass, frame: u64) {
        info!(
            session_id = %self.session_id,
            source = %self.source,
            class = %class,
            frame,
            "Alert raised: {}",
            class.description()
        );
    }

    pub fn log_alert_cleared(&self, class: ViolationClass, frame: u64) {
        info!(
            session_id = %self.session_id,
            source = %self.source,
            class = %class,
            frame,
            "Alert cleared"
        );
    }

    pub fn log_paused(&self) {
        info!(session_id = %self.session_id, source = %self.source, "Capture paused");
    }

    pub fn log_resumed(&self) {
        info!(session_id = %self.session_id, source = %self.source, "Capture resumed");
    }

    pub fn log_disconnected(&self, attempt: u32, retry_in: Duration, reason: &str) {
        warn!(
            session_id = %self.session_id,
            source = %self.source,
            attempt,
            retry_in_ms = retry_in.as_millis() as u64,
            "Frame source lost: {}",
            reason
        );
    }

    /// Log the final per-class totals and session statistics.
    pub fn log_summary(&self, summary: &SessionSummary) {
        for (class, entry) in &summary.ledger {
            info!(
                session_id = %self.session_id,
                class = %class,
                episodes = entry.alert_episodes,
                alert_frames = entry.total_alert_frames,
                alert_secs = entry.total_alert_duration.as_secs_f64(),
                mean_episode_secs = entry
                    .mean_episode_duration()
                    .unwrap_or_default()
                    .as_secs_f64(),
                "Session total"
            );
        }

        info!(
            session_id = %self.session_id,
            source = %self.source,
            frames_evaluated = summary.stats.frames_evaluated,
            frames_with_alerts = summary.stats.frames_with_alerts,
            frames_dropped = summary.frames_dropped,
            alert_ratio = summary.stats.alert_ratio(),
            "Monitoring session finished"
        );
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Create a tracing span for this session.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "session",
            session_id = %self.session_id,
            source = %self.source
        )
    }
}
