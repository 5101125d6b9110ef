//! Signal normalization.
//!
//! Reduces the raw detections of every detector in the ensemble to exactly
//! one `Observation` per configured class:
//!
//! - duplicate reports of a class are merged by maximum score (union of
//!   evidence across detectors)
//! - scores are clamped into [0, 1]; non-finite scores count as 0
//! - classes nobody reported are emitted as absent
//! - reports for classes that are not configured are ignored
//!
//! Nothing here fails. Anything that had to be repaired is returned as a
//! `MalformedObservation` so the caller can log and count it.

use std::collections::BTreeMap;
use thiserror::Error;

use vigil_models::{Detection, Observation, ViolationClass};

use crate::config::EngineConfig;

/// Per-frame input that was repaired or dropped during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum MalformedObservation {
    #[error("{class}: score {score} outside [0, 1], clamped")]
    ScoreOutOfRange { class: ViolationClass, score: f32 },

    #[error("{class}: non-finite score, treated as 0")]
    NonFiniteScore { class: ViolationClass },

    #[error("{class}: class is not configured, ignored")]
    UnconfiguredClass { class: ViolationClass },
}

impl MalformedObservation {
    /// Short kind label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            MalformedObservation::ScoreOutOfRange { .. } => "score_out_of_range",
            MalformedObservation::NonFiniteScore { .. } => "non_finite_score",
            MalformedObservation::UnconfiguredClass { .. } => "unconfigured_class",
        }
    }

    pub fn class(&self) -> ViolationClass {
        match self {
            MalformedObservation::ScoreOutOfRange { class, .. }
            | MalformedObservation::NonFiniteScore { class }
            | MalformedObservation::UnconfiguredClass { class } => *class,
        }
    }
}

/// Normalizer output for one frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedFrame {
    /// One observation per configured class, in configuration order.
    pub observations: Vec<Observation>,
    pub malformed: Vec<MalformedObservation>,
}

/// Clamp a raw score into [0, 1].
pub fn sanitize_score(class: ViolationClass, score: f32) -> (f32, Option<MalformedObservation>) {
    if !score.is_finite() {
        return (0.0, Some(MalformedObservation::NonFiniteScore { class }));
    }
    if !(0.0..=1.0).contains(&score) {
        return (
            score.clamp(0.0, 1.0),
            Some(MalformedObservation::ScoreOutOfRange { class, score }),
        );
    }
    (score, None)
}

/// Merge detections by class, keeping the maximum sanitized score.
pub fn merge_detections(
    detections: &[Detection],
) -> (BTreeMap<ViolationClass, f32>, Vec<MalformedObservation>) {
    let mut merged: BTreeMap<ViolationClass, f32> = BTreeMap::new();
    let mut malformed = Vec::new();

    for detection in detections {
        let (score, issue) = sanitize_score(detection.class, detection.score);
        malformed.extend(issue);

        merged
            .entry(detection.class)
            .and_modify(|best| *best = best.max(score))
            .or_insert(score);
    }

    (merged, malformed)
}

/// Maps ensemble detections onto the configured class set.
#[derive(Debug, Clone)]
pub struct SignalNormalizer {
    /// (class, confidence_threshold) in configuration order
    thresholds: Vec<(ViolationClass, f32)>,
}

impl SignalNormalizer {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            thresholds: config
                .classes
                .iter()
                .map(|c| (c.class, c.confidence_threshold))
                .collect(),
        }
    }

    pub fn normalize(&self, detections: &[Detection]) -> NormalizedFrame {
        let (mut merged, mut malformed) = merge_detections(detections);

        let observations = self
            .thresholds
            .iter()
            .map(|&(class, threshold)| match merged.remove(&class) {
                Some(score) => Observation {
                    class,
                    score,
                    present: score >= threshold,
                },
                None => Observation::absent(class),
            })
            .collect();

        // Whatever is left was reported but not configured.
        malformed.extend(
            merged
                .into_keys()
                .map(|class| MalformedObservation::UnconfiguredClass { class }),
        );

        NormalizedFrame {
            observations,
            malformed,
        }
    }
}
