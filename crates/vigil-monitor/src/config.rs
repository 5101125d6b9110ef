//! Monitor configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Largest allowed queue between two pipeline stages.
pub const MAX_QUEUE_CAPACITY: usize = 3;

/// Monitor configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Engine configuration file (JSON/TOML/YAML); built-in defaults when unset
    pub config_path: Option<PathBuf>,
    /// Recorded detector output to replay
    pub replay_path: Option<PathBuf>,
    /// Frames buffered before and after inference (1..=3)
    pub queue_capacity: usize,
    /// Delay between reconnect attempts after source loss
    pub source_retry_delay: Duration,
    /// Reconnect attempts before the monitor gives up
    pub max_source_retries: u32,
    /// Prometheus listener address
    pub metrics_addr: Option<SocketAddr>,
    /// Pace replay at the frame interval, which makes it a live source
    pub realtime: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            config_path: None,
            replay_path: None,
            queue_capacity: 2,
            source_retry_delay: Duration::from_millis(500),
            max_source_retries: 5,
            metrics_addr: None,
            realtime: false,
        }
    }
}

impl MonitorConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            config_path: std::env::var("VIGIL_CONFIG_PATH").ok().map(PathBuf::from),
            replay_path: std::env::var("VIGIL_REPLAY_PATH").ok().map(PathBuf::from),
            queue_capacity: clamp_queue_capacity(
                std::env::var("VIGIL_QUEUE_CAPACITY")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2),
            ),
            source_retry_delay: Duration::from_millis(
                std::env::var("VIGIL_SOURCE_RETRY_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(500),
            ),
            max_source_retries: std::env::var("VIGIL_MAX_SOURCE_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
            metrics_addr: std::env::var("VIGIL_METRICS_ADDR")
                .ok()
                .and_then(|s| s.parse().ok()),
            realtime: std::env::var("VIGIL_REALTIME")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }
}

pub fn clamp_queue_capacity(capacity: usize) -> usize {
    capacity.clamp(1, MAX_QUEUE_CAPACITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::default();
        assert_eq!(config.queue_capacity, 2);
        assert!(!config.realtime);
        assert!(config.metrics_addr.is_none());
    }

    #[test]
    fn test_queue_capacity_is_clamped() {
        assert_eq!(clamp_queue_capacity(0), 1);
        assert_eq!(clamp_queue_capacity(2), 2);
        assert_eq!(clamp_queue_capacity(64), MAX_QUEUE_CAPACITY);
    }
}
