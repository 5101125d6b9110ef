//! Detector ensemble.
//!
//! Every detector sees the same frame and reports `Detection`s for the
//! classes it knows about. The ensemble runs them in parallel on the rayon
//! pool and concatenates their output; merging duplicates is the engine
//! normalizer's job.

use rayon::prelude::*;
use tracing::{debug, trace, warn};

use vigil_engine::{EngineConfig, LabelMap, LandmarkConfig};
use vigil_models::Detection;

use crate::error::MonitorResult;
use crate::source::{Frame, MAX_FACES};

/// Per-frame detector.
///
/// Detectors are synchronous and run on blocking threads.
pub trait Detector: Send + Sync {
    fn detect(&self, frame: &Frame) -> MonitorResult<Vec<Detection>>;

    /// Detector name for logging.
    fn name(&self) -> &'static str;
}

/// Eye closure and yawning from face landmarks or ratios.
///
/// Every face in the frame is scored; the normalizer's max-merge then
/// alerts when any one of them is asleep or yawning.
#[derive(Debug, Clone, Default)]
pub struct LandmarkDetector {
    config: LandmarkConfig,
}

impl LandmarkDetector {
    pub fn new(config: LandmarkConfig) -> Self {
        Self { config }
    }
}

impl Detector for LandmarkDetector {
    fn detect(&self, frame: &Frame) -> MonitorResult<Vec<Detection>> {
        let mut detections = Vec::new();
        let mut eyes_closed = 0;

        for face in frame.payload.faces.iter().take(MAX_FACES) {
            let signal = face.signal();
            if signal.any_eye_closed(&self.config) {
                eyes_closed += 1;
            }
            detections.extend(signal.to_detections(&self.config));
        }

        if frame.payload.faces.len() > MAX_FACES {
            debug!(
                frame = frame.info.index,
                faces = frame.payload.faces.len(),
                "Too many faces, scoring the first {}",
                MAX_FACES
            );
        }
        if eyes_closed > 0 {
            trace!(frame = frame.info.index, faces = eyes_closed, "Eyes closed");
        }

        Ok(detections)
    }

    fn name(&self) -> &'static str {
        "landmarks"
    }
}

/// Maps labeled object boxes onto violation classes.
#[derive(Debug, Clone, Default)]
pub struct ObjectLabelDetector {
    labels: LabelMap,
}

impl ObjectLabelDetector {
    pub fn new(labels: LabelMap) -> Self {
        Self { labels }
    }
}

impl Detector for ObjectLabelDetector {
    fn detect(&self, frame: &Frame) -> MonitorResult<Vec<Detection>> {
        let mut detections = Vec::new();
        for object in &frame.payload.objects {
            match self.labels.to_detection(&object.label, object.score, object.bbox) {
                Some(detection) => detections.push(detection),
                None => debug!(
                    frame = frame.info.index,
                    label = %object.label,
                    "Ignoring unrelated object label"
                ),
            }
        }
        Ok(detections)
    }

    fn name(&self) -> &'static str {
        "object_labels"
    }
}

/// Passes through detections that were classified upstream.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordedDetector;

impl Detector for RecordedDetector {
    fn detect(&self, frame: &Frame) -> MonitorResult<Vec<Detection>> {
        Ok(frame.payload.detections.clone())
    }

    fn name(&self) -> &'static str {
        "recorded"
    }
}

/// Set of detectors run against every frame.
#[derive(Default)]
pub struct DetectorEnsemble {
    detectors: Vec<Box<dyn Detector>>,
}

impl DetectorEnsemble {
    pub fn new() -> Self {
        Self::default()
    }

    /// Landmark, object label and recorded detectors configured from `config`.
    ///
    /// The landmark detector is left out when no landmark-derived class is
    /// monitored.
    pub fn standard(config: &EngineConfig) -> Self {
        let mut ensemble = Self::new();
        if config
            .monitored_classes()
            .any(|class| class.is_landmark_derived())
        {
            ensemble = ensemble.with_detector(LandmarkDetector::new(config.landmarks.clone()));
        }
        ensemble
            .with_detector(ObjectLabelDetector::new(LabelMap::new(&config.labels)))
            .with_detector(RecordedDetector)
    }

    pub fn with_detector(mut self, detector: impl Detector + 'static) -> Self {
        self.detectors.push(Box::new(detector));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Run every detector on `frame`.
    ///
    /// A failing detector contributes nothing for this frame; the others
    /// still count.
    pub fn detect(&self, frame: &Frame) -> Vec<Detection> {
        let per_detector: Vec<Vec<Detection>> = self
            .detectors
            .par_iter()
            .map(|detector| match detector.detect(frame) {
                Ok(detections) => detections,
                Err(e) => {
                    warn!(
                        frame = frame.info.index,
                        detector = detector.name(),
                        "Detector failed, treating frame as empty: {}",
                        e
                    );
                    Vec::new()
                }
            })
            .collect();

        per_detector.into_iter().flatten().collect()
    }
}
