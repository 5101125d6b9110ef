//! Monitor error types.

use thiserror::Error;
use vigil_engine::ConfigError;

pub type MonitorResult<T> = Result<T, MonitorError>;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Frame source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Detector {detector} failed: {message}")]
    Detector {
        detector: &'static str,
        message: String,
    },

    #[error("Replay line {line}: {message}")]
    Replay { line: usize, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Pipeline channel closed: {0}")]
    ChannelClosed(&'static str),

    #[error("Pipeline task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MonitorError {
    pub fn source_unavailable(msg: impl Into<String>) -> Self {
        Self::SourceUnavailable(msg.into())
    }

    pub fn detector(detector: &'static str, msg: impl Into<String>) -> Self {
        Self::Detector {
            detector,
            message: msg.into(),
        }
    }

    pub fn replay(line: usize, msg: impl Into<String>) -> Self {
        Self::Replay {
            line,
            message: msg.into(),
        }
    }

    /// Whether the frame source may come back after a reconnect.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MonitorError::SourceUnavailable(_) | MonitorError::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(MonitorError::source_unavailable("camera unplugged").is_retryable());
        assert!(MonitorError::Io(std::io::Error::other("broken pipe")).is_retryable());
        assert!(!MonitorError::replay(3, "expected value").is_retryable());
        assert!(!MonitorError::detector("landmarks", "bad face").is_retryable());
    }

    #[test]
    fn test_replay_error_names_line() {
        let err = MonitorError::replay(12, "trailing characters");
        assert_eq!(err.to_string(), "Replay line 12: trailing characters");
    }
}
