//! Error types for engine configuration.
//!
//! Configuration is the only fallible part of the engine: once a
//! `TriggerEngine` exists, per-frame evaluation cannot fail. Bad per-frame
//! input is normalized and reported as a `MalformedObservation` instead.

use thiserror::Error;
use vigil_models::ViolationClass;

/// Result type for configuration loading and validation.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Invalid or unloadable engine configuration. Always fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No violation classes configured")]
    NoClasses,

    #[error("Class {0} is configured more than once")]
    DuplicateClass(ViolationClass),

    #[error("Class {class}: confidence_threshold must be within [0, 1], got {value}")]
    InvalidThreshold { class: ViolationClass, value: f32 },

    #[error("Class {class}: buffer_size must be at least 1")]
    InvalidBufferSize { class: ViolationClass },

    #[error("Class {class}: {field} must be at least 1")]
    InvalidFrameCount {
        class: ViolationClass,
        field: &'static str,
    },

    #[error("Class {class}: {field} ({value}) exceeds buffer_size ({buffer_size})")]
    ThresholdExceedsBuffer {
        class: ViolationClass,
        field: &'static str,
        value: u32,
        buffer_size: usize,
    },

    #[error("frame_interval_ms must be at least 1")]
    InvalidFrameInterval,

    #[error("Landmark {name} must be positive and finite, got {value}")]
    InvalidLandmarkThreshold { name: &'static str, value: f32 },

    #[error("Failed to load configuration: {0}")]
    Load(String),
}

impl ConfigError {
    /// Create a load failure error.
    pub fn load(message: impl Into<String>) -> Self {
        Self::Load(message.into())
    }

    /// The class the error refers to, if any.
    pub fn class(&self) -> Option<ViolationClass> {
        match self {
            ConfigError::DuplicateClass(class)
            | ConfigError::InvalidThreshold { class, .. }
            | ConfigError::InvalidBufferSize { class }
            | ConfigError::InvalidFrameCount { class, .. }
            | ConfigError::ThresholdExceedsBuffer { class, .. } => Some(*class),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        Self::Load(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_class() {
        let err = ConfigError::ThresholdExceedsBuffer {
            class: ViolationClass::PhoneUse,
            field: "consecutive_frames_to_raise",
            value: 9,
            buffer_size: 5,
        };
        let msg = err.to_string();
        assert!(msg.contains("phone_use"));
        assert!(msg.contains("consecutive_frames_to_raise"));
        assert_eq!(err.class(), Some(ViolationClass::PhoneUse));
        assert_eq!(ConfigError::NoClasses.class(), None);
    }
}
