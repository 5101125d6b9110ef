//! Pipelined frame monitor for the Vigil trigger engine.
//!
//! This crate provides:
//! - Frame sources (JSONL replay, channel-fed live sources)
//! - A parallel detector ensemble
//! - The capture / inference / evaluation pipeline with pause, reconnect
//!   and session reset
//! - Structured session logging

pub mod config;
pub mod detector;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod queue;
pub mod replay;
pub mod source;
pub mod status;

pub use config::MonitorConfig;
pub use detector::{Detector, DetectorEnsemble, LandmarkDetector, ObjectLabelDetector, RecordedDetector};
pub use error::{MonitorError, MonitorResult};
pub use logging::SessionLogger;
pub use pipeline::{Monitor, MonitorHandle, SessionSummary, ShutdownTrigger};
pub use queue::{FrameQueue, OverflowPolicy, PushOutcome};
pub use replay::ReplaySource;
pub use source::{ChannelSource, FaceRecord, Frame, FramePayload, FrameSource, LabeledObject};
pub use status::MonitorStatus;
