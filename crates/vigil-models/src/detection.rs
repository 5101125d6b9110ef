//! Detector outputs and per-frame observations.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ViolationClass;

/// Bounding box in normalized coordinates [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Get the center point in normalized coordinates.
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Get area (normalized).
    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// A single detector output for one frame.
///
/// Detectors may report the same class more than once per frame; the
/// normalizer merges duplicates. The box is carried for collaborators that
/// draw overlays and is ignored by the trigger logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Detection {
    pub class: ViolationClass,
    /// Detector confidence, nominally [0, 1]. Out-of-range values are
    /// clamped during normalization.
    pub score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
}

impl Detection {
    pub fn new(class: ViolationClass, score: f32) -> Self {
        Self {
            class,
            score,
            bbox: None,
        }
    }

    pub fn with_bbox(class: ViolationClass, score: f32, bbox: BoundingBox) -> Self {
        Self {
            class,
            score,
            bbox: Some(bbox),
        }
    }
}

/// Normalized observation: exactly one per configured class per frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Observation {
    pub class: ViolationClass,
    /// Merged score in [0, 1].
    pub score: f32,
    /// Whether the score meets the class confidence threshold.
    pub present: bool,
}

impl Observation {
    /// Observation for a class no detector reported this frame.
    pub fn absent(class: ViolationClass) -> Self {
        Self {
            class,
            score: 0.0,
            present: false,
        }
    }
}
