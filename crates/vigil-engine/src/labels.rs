//! Label mapping for general-purpose object detectors.
//!
//! General detectors report free-text labels from their own vocabulary
//! (COCO's `"cell phone"`, a custom model's `"cigarette"`). Only a handful
//! of those matter for safety monitoring; everything else is dropped here.

use std::collections::HashMap;

use vigil_models::{BoundingBox, Detection, ViolationClass};

use crate::config::LabelRule;

/// Built-in label vocabulary.
pub const DEFAULT_LABELS: &[(&str, ViolationClass)] = &[
    ("cell phone", ViolationClass::PhoneUse),
    ("cellphone", ViolationClass::PhoneUse),
    ("mobile phone", ViolationClass::PhoneUse),
    ("phone", ViolationClass::PhoneUse),
    ("cigarette", ViolationClass::Smoking),
    ("cigar", ViolationClass::Smoking),
    ("smoke", ViolationClass::Smoking),
    ("smoking", ViolationClass::Smoking),
    ("eyes closed", ViolationClass::Sleeping),
    ("yawn", ViolationClass::Fatigue),
];

/// Case-insensitive label to class lookup.
#[derive(Debug, Clone)]
pub struct LabelMap {
    labels: HashMap<String, ViolationClass>,
}

impl Default for LabelMap {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl LabelMap {
    /// Built-in vocabulary extended (and overridden) by `rules`.
    pub fn new(rules: &[LabelRule]) -> Self {
        let mut labels: HashMap<String, ViolationClass> = DEFAULT_LABELS
            .iter()
            .map(|(label, class)| (normalize_label(label), *class))
            .collect();

        for rule in rules {
            labels.insert(normalize_label(&rule.label), rule.class);
        }

        Self { labels }
    }

    pub fn class_for(&self, label: &str) -> Option<ViolationClass> {
        self.labels.get(&normalize_label(label)).copied()
    }

    /// Convert a labeled box, or `None` if the label is not a violation.
    pub fn to_detection(
        &self,
        label: &str,
        score: f32,
        bbox: Option<BoundingBox>,
    ) -> Option<Detection> {
        self.class_for(label).map(|class| Detection { class, score, bbox })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

fn normalize_label(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .replace(['_', '-'], " ")
}
