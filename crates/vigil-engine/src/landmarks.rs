//! Face landmark signals.
//!
//! Converts eye and mouth landmark geometry into `Detection`s so that
//! landmark-derived classes go through the same normalize/smooth/debounce
//! path as object detector output.
//!
//! # Eye aspect ratio
//! With the six eye landmarks ordered `p1..p6` (corners at `p1`/`p4`, upper
//! lid `p2`/`p3`, lower lid `p6`/`p5`):
//!
//! ```text
//! EAR = (|p2 - p6| + |p3 - p5|) / (2 * |p1 - p4|)
//! ```
//!
//! An eye is closed when `EAR < ear_threshold`. A face counts as having its
//! eyes closed when either eye is closed, so the smaller EAR drives the score.
//!
//! # Score mapping
//! Scores are linear in the ratio and pass through 0.5 exactly at the
//! configured threshold, so a class `confidence_threshold` of 0.5 means
//! "at the landmark threshold".

use serde::{Deserialize, Serialize};

use vigil_models::{Detection, ViolationClass};

use crate::config::LandmarkConfig;

/// 2D landmark point in pixel or normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Eye aspect ratio over six landmarks, or `None` for degenerate geometry.
pub fn eye_aspect_ratio(points: &[Point; 6]) -> Option<f32> {
    let [p1, p2, p3, p4, p5, p6] = points;
    let horizontal = p1.distance(p4);
    if !horizontal.is_finite() || horizontal <= f32::EPSILON {
        return None;
    }
    let vertical = p2.distance(p6) + p3.distance(p5);
    Some(vertical / (2.0 * horizontal))
}

/// Mouth aspect ratio over eight inner-lip landmarks, or `None` for
/// degenerate geometry.
///
/// Corners at `m1`/`m5`, upper lip `m2..m4`, lower lip `m8..m6`:
/// `MAR = (|m2 - m8| + |m3 - m7| + |m4 - m6|) / (2 * |m1 - m5|)`.
pub fn mouth_aspect_ratio(points: &[Point; 8]) -> Option<f32> {
    let [m1, m2, m3, m4, m5, m6, m7, m8] = points;
    let horizontal = m1.distance(m5);
    if !horizontal.is_finite() || horizontal <= f32::EPSILON {
        return None;
    }
    let vertical = m2.distance(m8) + m3.distance(m7) + m4.distance(m6);
    Some(vertical / (2.0 * horizontal))
}

/// Landmark-derived ratios for one face.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FaceSignal {
    pub left_ear: Option<f32>,
    pub right_ear: Option<f32>,
    #[serde(default)]
    pub mar: Option<f32>,
}

impl FaceSignal {
    /// Build from raw landmark points.
    pub fn from_landmarks(
        left_eye: &[Point; 6],
        right_eye: &[Point; 6],
        mouth: Option<&[Point; 8]>,
    ) -> Self {
        Self {
            left_ear: eye_aspect_ratio(left_eye),
            right_ear: eye_aspect_ratio(right_eye),
            mar: mouth.and_then(mouth_aspect_ratio),
        }
    }

    /// Smaller of the two eye ratios; either eye closing counts.
    pub fn min_ear(&self) -> Option<f32> {
        match (self.left_ear, self.right_ear) {
            (Some(l), Some(r)) => Some(l.min(r)),
            (Some(v), None) | (None, Some(v)) => Some(v),
            (None, None) => None,
        }
    }

    /// Whether either eye is below the closed threshold.
    pub fn any_eye_closed(&self, config: &LandmarkConfig) -> bool {
        self.min_ear()
            .is_some_and(|ear| ear < config.ear_threshold)
    }

    /// Convert to `Sleeping` / `Fatigue` detections.
    ///
    /// Missing ratios produce no detection, which the normalizer treats as
    /// absence for the frame.
    pub fn to_detections(&self, config: &LandmarkConfig) -> Vec<Detection> {
        let mut detections = Vec::with_capacity(2);

        if let Some(ear) = self.min_ear().filter(|v| v.is_finite()) {
            detections.push(Detection::new(
                ViolationClass::Sleeping,
                eye_closure_score(ear, config.ear_threshold),
            ));
        }

        if let Some(mar) = self.mar.filter(|v| v.is_finite()) {
            detections.push(Detection::new(
                ViolationClass::Fatigue,
                yawn_score(mar, config.mar_threshold),
            ));
        }

        detections
    }
}

/// 1.0 for a fully shut eye, 0.5 at the threshold, 0.0 at twice the threshold.
pub fn eye_closure_score(ear: f32, ear_threshold: f32) -> f32 {
    let span = 2.0 * ear_threshold;
    ((span - ear) / span).clamp(0.0, 1.0)
}

/// 0.0 for a closed mouth, 0.5 at the threshold, 1.0 at twice the threshold.
pub fn yawn_score(mar: f32, mar_threshold: f32) -> f32 {
    (mar / (2.0 * mar_threshold)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eye(openness: f32) -> [Point; 6] {
        // 1.0 wide, lids `openness` apart -> EAR == openness
        [
            Point::new(0.0, 0.0),
            Point::new(0.33, openness / 2.0),
            Point::new(0.66, openness / 2.0),
            Point::new(1.0, 0.0),
            Point::new(0.66, -openness / 2.0),
            Point::new(0.33, -openness / 2.0),
        ]
    }

    #[test]
    fn test_eye_aspect_ratio() {
        let ear = eye_aspect_ratio(&eye(0.3)).unwrap();
        assert!((ear - 0.3).abs() < 1e-5);
    }

    #[test]
    fn test_degenerate_eye_has_no_ratio() {
        let collapsed = [Point::new(0.5, 0.5); 6];
        assert_eq!(eye_aspect_ratio(&collapsed), None);
    }

    #[test]
    fn test_mouth_aspect_ratio() {
        let mouth = [
            Point::new(0.0, 0.0),
            Point::new(0.25, 0.4),
            Point::new(0.5, 0.4),
            Point::new(0.75, 0.4),
            Point::new(1.0, 0.0),
            Point::new(0.75, -0.4),
            Point::new(0.5, -0.4),
            Point::new(0.25, -0.4),
        ];
        // (0.8 * 3) / 2
        let mar = mouth_aspect_ratio(&mouth).unwrap();
        assert!((mar - 1.2).abs() < 1e-5);
    }

    #[test]
    fn test_scores_cross_half_at_threshold() {
        assert!((eye_closure_score(0.15, 0.15) - 0.5).abs() < 1e-6);
        assert_eq!(eye_closure_score(0.0, 0.15), 1.0);
        assert_eq!(eye_closure_score(0.4, 0.15), 0.0);

        assert!((yawn_score(0.6, 0.6) - 0.5).abs() < 1e-6);
        assert_eq!(yawn_score(0.0, 0.6), 0.0);
        assert_eq!(yawn_score(2.0, 0.6), 1.0);
    }

    #[test]
    fn test_either_eye_closed_counts() {
        let config = LandmarkConfig::default();
        let winking = FaceSignal {
            left_ear: Some(0.05),
            right_ear: Some(0.3),
            mar: None,
        };
        assert!(winking.any_eye_closed(&config));

        let dets = winking.to_detections(&config);
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].class, ViolationClass::Sleeping);
        assert!(dets[0].score > 0.5);
    }

    #[test]
    fn test_open_eyes_and_yawn() {
        let config = LandmarkConfig::default();
        let face = FaceSignal::from_landmarks(&eye(0.3), &eye(0.28), None);
        assert!(!face.any_eye_closed(&config));

        let yawning = FaceSignal {
            mar: Some(0.9),
            ..face
        };
        let dets = yawning.to_detections(&config);
        assert_eq!(dets.len(), 2);
        assert!(dets[0].score < 0.5);
        assert_eq!(dets[1].class, ViolationClass::Fatigue);
        assert!(dets[1].score > 0.5);
    }

    #[test]
    fn test_missing_signal_yields_no_detections() {
        let config = LandmarkConfig::default();
        assert!(FaceSignal::default().to_detections(&config).is_empty());

        let nan = FaceSignal {
            left_ear: Some(f32::NAN),
            right_ear: None,
            mar: None,
        };
        assert!(nan.to_detections(&config).is_empty());
    }
}
