//! Engine metrics collection.
//!
//! Provides standardized metrics for monitoring trigger evaluation:
//! - Frame and alert edge counters
//! - Malformed input counters by kind
//! - Active alert gauge and evaluation latency

use metrics::{counter, gauge, histogram};
use vigil_models::ViolationClass;

// =============================================================================
// Metric Names
// =============================================================================

/// Metric name constants for consistency.
pub mod names {
    /// Total frames evaluated.
    pub const FRAMES_EVALUATED_TOTAL: &str = "vigil_frames_evaluated_total";

    /// Total alert episodes started, by class.
    pub const ALERTS_RAISED_TOTAL: &str = "vigil_alerts_raised_total";

    /// Total alert episodes ended, by class.
    pub const ALERTS_CLEARED_TOTAL: &str = "vigil_alerts_cleared_total";

    /// Total repaired or ignored observations, by kind.
    pub const MALFORMED_OBSERVATIONS_TOTAL: &str = "vigil_malformed_observations_total";

    /// Number of classes currently in alert.
    pub const ACTIVE_ALERTS: &str = "vigil_active_alerts";

    /// Per-frame evaluation latency in seconds.
    pub const EVALUATE_SECONDS: &str = "vigil_evaluate_seconds";
}

// =============================================================================
// Recording Functions
// =============================================================================

/// Record a completed frame evaluation.
pub fn record_frame(active_alerts: usize, elapsed_secs: f64) {
    counter!(names::FRAMES_EVALUATED_TOTAL).increment(1);
    gauge!(names::ACTIVE_ALERTS).set(active_alerts as f64);
    histogram!(names::EVALUATE_SECONDS).record(elapsed_secs);
}

pub fn record_alert_raised(class: ViolationClass) {
    counter!(names::ALERTS_RAISED_TOTAL, "class" => class.as_str()).increment(1);
}

pub fn record_alert_cleared(class: ViolationClass) {
    counter!(names::ALERTS_CLEARED_TOTAL, "class" => class.as_str()).increment(1);
}

pub fn record_malformed(kind: &'static str) {
    counter!(names::MALFORMED_OBSERVATIONS_TOTAL, "kind" => kind).increment(1);
}

// =============================================================================
// Tests
// =============================================================================
