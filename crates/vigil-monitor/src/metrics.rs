//! Pipeline metrics.

use metrics::counter;

pub mod names {
    /// Frames discarded by the drop-oldest queue.
    pub const FRAMES_DROPPED_TOTAL: &str = "vigil_frames_dropped_total";

    /// Reconnect attempts after source loss.
    pub const SOURCE_RECONNECTS_TOTAL: &str = "vigil_source_reconnects_total";
}

pub fn record_frame_dropped() {
    counter!(names::FRAMES_DROPPED_TOTAL).increment(1);
}

pub fn record_reconnect(source: &'static str) {
    counter!(names::SOURCE_RECONNECTS_TOTAL, "source" => source).increment(1);
}
