//! Configuration for the trigger engine.
//!
//! Loaded once at startup and immutable for the session. Every value is
//! validated before an engine can be built from it; there are no silent
//! defaults for per-class thresholds.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use vigil_models::ViolationClass;

use crate::error::{ConfigError, ConfigResult};

/// Environment prefix for overrides, e.g. `VIGIL__FRAME_INTERVAL_MS=40`.
pub const ENV_PREFIX: &str = "VIGIL";

/// Per-class trigger thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassConfig {
    pub class: ViolationClass,

    /// Minimum merged score counted as a raw "present" sample (0.0 - 1.0)
    pub confidence_threshold: f32,

    /// Consecutive smoothed-present frames required to raise an alert
    pub consecutive_frames_to_raise: u32,

    /// Consecutive smoothed-absent frames required to clear an alert
    pub consecutive_frames_to_clear: u32,

    /// Rolling window length for majority smoothing
    pub buffer_size: usize,
}

impl ClassConfig {
    pub fn new(
        class: ViolationClass,
        confidence_threshold: f32,
        consecutive_frames_to_raise: u32,
        consecutive_frames_to_clear: u32,
        buffer_size: usize,
    ) -> Self {
        Self {
            class,
            confidence_threshold,
            consecutive_frames_to_raise,
            consecutive_frames_to_clear,
            buffer_size,
        }
    }

    /// Set the confidence threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Set raise and clear frame counts.
    pub fn with_debounce(mut self, raise: u32, clear: u32) -> Self {
        self.consecutive_frames_to_raise = raise;
        self.consecutive_frames_to_clear = clear;
        self
    }

    /// Set the smoothing window length.
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Validate thresholds and sizes.
    pub fn validate(&self) -> ConfigResult<()> {
        let class = self.class;

        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::InvalidThreshold {
                class,
                value: self.confidence_threshold,
            });
        }

        if self.buffer_size == 0 {
            return Err(ConfigError::InvalidBufferSize { class });
        }

        for (field, value) in [
            ("consecutive_frames_to_raise", self.consecutive_frames_to_raise),
            ("consecutive_frames_to_clear", self.consecutive_frames_to_clear),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidFrameCount { class, field });
            }
            if value as usize > self.buffer_size {
                return Err(ConfigError::ThresholdExceedsBuffer {
                    class,
                    field,
                    value,
                    buffer_size: self.buffer_size,
                });
            }
        }

        Ok(())
    }
}

/// Thresholds for converting face landmark ratios into scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkConfig {
    /// Eye aspect ratio below which an eye counts as closed (default: 0.15)
    pub ear_threshold: f32,

    /// Mouth aspect ratio above which the mouth counts as yawning (default: 0.6)
    pub mar_threshold: f32,
}

impl Default for LandmarkConfig {
    fn default() -> Self {
        Self {
            ear_threshold: 0.15,
            mar_threshold: 0.6,
        }
    }
}

impl LandmarkConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        for (name, value) in [
            ("ear_threshold", self.ear_threshold),
            ("mar_threshold", self.mar_threshold),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidLandmarkThreshold { name, value });
            }
        }
        Ok(())
    }
}

/// Maps a free-text detector label onto a violation class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelRule {
    pub label: String,
    pub class: ViolationClass,
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Nominal time between frames, used for duration accounting (default: 33)
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    /// One entry per monitored class
    pub classes: Vec<ClassConfig>,

    #[serde(default)]
    pub landmarks: LandmarkConfig,

    /// Extra label mappings on top of the built-in ones
    #[serde(default)]
    pub labels: Vec<LabelRule>,
}

fn default_frame_interval_ms() -> u64 {
    33
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval_ms(),
            classes: vec![
                ClassConfig::new(ViolationClass::Sleeping, 0.5, 30, 15, 30),
                ClassConfig::new(ViolationClass::Fatigue, 0.5, 15, 15, 15),
                ClassConfig::new(ViolationClass::PhoneUse, 0.5, 10, 10, 10),
                ClassConfig::new(ViolationClass::Smoking, 0.45, 10, 10, 10),
            ],
            landmarks: LandmarkConfig::default(),
            labels: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Load from a JSON/TOML/YAML file, with `VIGIL__*` environment
    /// overrides, and validate.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::load(format!(
                "config file not found: {}",
                path.display()
            )));
        }

        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: EngineConfig = settings.try_deserialize()?;
        config.validate()?;

        info!(
            path = %path.display(),
            classes = config.classes.len(),
            frame_interval_ms = config.frame_interval_ms,
            "Engine configuration loaded"
        );

        Ok(config)
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(json, config::FileFormat::Json))
            .build()?;

        let config: EngineConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every class plus the global settings.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.classes.is_empty() {
            return Err(ConfigError::NoClasses);
        }

        if self.frame_interval_ms == 0 {
            return Err(ConfigError::InvalidFrameInterval);
        }

        let mut seen = BTreeSet::new();
        for class_config in &self.classes {
            if !seen.insert(class_config.class) {
                return Err(ConfigError::DuplicateClass(class_config.class));
            }
            class_config.validate()?;
        }

        self.landmarks.validate()
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// Configuration for one class, if monitored.
    pub fn class(&self, class: ViolationClass) -> Option<&ClassConfig> {
        self.classes.iter().find(|c| c.class == class)
    }

    /// Monitored classes in configuration order.
    pub fn monitored_classes(&self) -> impl Iterator<Item = ViolationClass> + '_ {
        self.classes.iter().map(|c| c.class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phone(raise: u32, clear: u32, buffer: usize) -> ClassConfig {
        ClassConfig::new(ViolationClass::PhoneUse, 0.5, raise, clear, buffer)
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.frame_interval(), Duration::from_millis(33));
        assert_eq!(config.monitored_classes().count(), ViolationClass::ALL.len());
    }

    #[test]
    fn test_threshold_out_of_range() {
        let err = phone(3, 3, 5).with_threshold(1.2).validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidThreshold { .. }));

        let err = phone(3, 3, 5).with_threshold(f32::NAN).validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidThreshold { .. }));

        assert!(phone(3, 3, 5).with_threshold(0.0).validate().is_ok());
        assert!(phone(3, 3, 5).with_threshold(1.0).validate().is_ok());
    }

    #[test]
    fn test_zero_sizes_rejected() {
        assert!(matches!(
            phone(1, 1, 0).validate().unwrap_err(),
            ConfigError::InvalidBufferSize { .. }
        ));
        assert!(matches!(
            phone(0, 1, 5).validate().unwrap_err(),
            ConfigError::InvalidFrameCount {
                field: "consecutive_frames_to_raise",
                ..
            }
        ));
        assert!(matches!(
            phone(1, 0, 5).validate().unwrap_err(),
            ConfigError::InvalidFrameCount {
                field: "consecutive_frames_to_clear",
                ..
            }
        ));
    }

    #[test]
    fn test_threshold_exceeding_buffer_rejected() {
        let err = phone(6, 2, 5).validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ThresholdExceedsBuffer {
                value: 6,
                buffer_size: 5,
                ..
            }
        ));
        assert!(phone(5, 5, 5).validate().is_ok());
    }

    #[test]
    fn test_engine_config_rules() {
        let mut config = EngineConfig::default();
        config.classes.clear();
        assert!(matches!(config.validate().unwrap_err(), ConfigError::NoClasses));

        let mut config = EngineConfig::default();
        config.classes.push(phone(3, 3, 5));
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::DuplicateClass(ViolationClass::PhoneUse)
        ));

        let mut config = EngineConfig::default();
        config.frame_interval_ms = 0;
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::InvalidFrameInterval
        ));

        let mut config = EngineConfig::default();
        config.landmarks.ear_threshold = 0.0;
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::InvalidLandmarkThreshold { name: "ear_threshold", .. }
        ));
    }

    #[test]
    fn test_from_json_str() {
        let config = EngineConfig::from_json_str(
            r#"{
                "frame_interval_ms": 40,
                "classes": [
                    {
                        "class": "phone_use",
                        "confidence_threshold": 0.5,
                        "consecutive_frames_to_raise": 3,
                        "consecutive_frames_to_clear": 4,
                        "buffer_size": 5
                    }
                ],
                "labels": [{ "label": "vape", "class": "smoking" }]
            }"#,
        )
        .unwrap();

        assert_eq!(config.frame_interval(), Duration::from_millis(40));
        assert_eq!(config.class(ViolationClass::PhoneUse), Some(&phone(3, 4, 5)));
        assert!(config.class(ViolationClass::Smoking).is_none());
        assert_eq!(config.landmarks, LandmarkConfig::default());
        assert_eq!(config.labels[0].class, ViolationClass::Smoking);
    }

    #[test]
    fn test_from_json_str_rejects_invalid_values() {
        let err = EngineConfig::from_json_str(
            r#"{
                "classes": [
                    {
                        "class": "smoking",
                        "confidence_threshold": 0.5,
                        "consecutive_frames_to_raise": 3,
                        "consecutive_frames_to_clear": 4,
                        "buffer_size": 2
                    }
                ]
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ThresholdExceedsBuffer { .. }));

        let err = EngineConfig::from_json_str(r#"{ "classes": "nope" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = EngineConfig::load("/nonexistent/vigil.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }
}
