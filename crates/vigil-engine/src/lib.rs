//! Debounced safety trigger engine.
//!
//! This crate provides:
//! - Validated per-class configuration loading
//! - Landmark ratio and detector label conversion into detections
//! - Ensemble normalization (max-score merge, explicit absence)
//! - Majority-vote smoothing and raise/clear debouncing per class
//! - Session ledger with per-class alert totals
//! - The `TriggerEngine` orchestrator tying these together per frame

pub mod config;
pub mod debounce;
pub mod engine;
pub mod error;
pub mod labels;
pub mod landmarks;
pub mod ledger;
pub mod metrics;
pub mod normalizer;
pub mod smoothing;

pub use config::{ClassConfig, EngineConfig, LabelRule, LandmarkConfig};
pub use debounce::{transition, DebounceThresholds, Debouncer};
pub use engine::TriggerEngine;
pub use error::{ConfigError, ConfigResult};
pub use labels::LabelMap;
pub use landmarks::{eye_aspect_ratio, mouth_aspect_ratio, FaceSignal, Point};
pub use ledger::SessionLedger;
pub use normalizer::{MalformedObservation, NormalizedFrame, SignalNormalizer};
pub use smoothing::SmoothingWindow;
