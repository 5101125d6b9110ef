//! Violation class definitions.
//!
//! A violation class is the identity the whole engine is keyed on. Every
//! detector output is reduced to one of these before smoothing:
//!
//! - `Sleeping`: eyes closed (landmark-derived)
//! - `Fatigue`: yawning / drooping (landmark-derived)
//! - `PhoneUse`: phone in hand or at the ear (object detector)
//! - `Smoking`: cigarette visible (object detector)

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Safety violation class.
///
/// Ordering is the declaration order and is used wherever alerts are
/// listed, so output is stable across runs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ViolationClass {
    /// Eyes closed for a sustained period.
    Sleeping,

    /// Signs of fatigue such as yawning.
    Fatigue,

    /// Mobile phone in use.
    PhoneUse,

    /// Smoking.
    Smoking,
}

impl ViolationClass {
    /// All known violation classes.
    pub const ALL: &'static [ViolationClass] = &[
        ViolationClass::Sleeping,
        ViolationClass::Fatigue,
        ViolationClass::PhoneUse,
        ViolationClass::Smoking,
    ];

    /// Returns the class name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationClass::Sleeping => "sleeping",
            ViolationClass::Fatigue => "fatigue",
            ViolationClass::PhoneUse => "phone_use",
            ViolationClass::Smoking => "smoking",
        }
    }

    /// Returns a human-readable description for alert banners.
    pub fn description(&self) -> &'static str {
        match self {
            ViolationClass::Sleeping => "Eyes closed / sleeping",
            ViolationClass::Fatigue => "Fatigue or yawning",
            ViolationClass::PhoneUse => "Phone use",
            ViolationClass::Smoking => "Smoking",
        }
    }

    /// Returns true if this class is derived from face landmarks rather
    /// than object detector boxes.
    pub fn is_landmark_derived(&self) -> bool {
        matches!(self, ViolationClass::Sleeping | ViolationClass::Fatigue)
    }
}

impl fmt::Display for ViolationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ViolationClass {
    type Err = ViolationClassParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sleeping" | "sleep" | "eyes_closed" => Ok(ViolationClass::Sleeping),
            "fatigue" | "yawning" => Ok(ViolationClass::Fatigue),
            "phone_use" | "phone" => Ok(ViolationClass::PhoneUse),
            "smoking" | "smoke" => Ok(ViolationClass::Smoking),
            _ => Err(ViolationClassParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown violation class: {0}")]
pub struct ViolationClassParseError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_parse() {
        assert_eq!("sleeping".parse::<ViolationClass>().unwrap(), ViolationClass::Sleeping);
        assert_eq!("Yawning".parse::<ViolationClass>().unwrap(), ViolationClass::Fatigue);
        assert_eq!("phone".parse::<ViolationClass>().unwrap(), ViolationClass::PhoneUse);
        assert_eq!(" smoking ".parse::<ViolationClass>().unwrap(), ViolationClass::Smoking);
        assert!("laptop".parse::<ViolationClass>().is_err());
    }

    #[test]
    fn test_class_display_matches_serde() {
        for class in ViolationClass::ALL {
            let json = serde_json::to_string(class).unwrap();
            assert_eq!(json, format!("\"{}\"", class));
        }
    }

    #[test]
    fn test_class_ordering_is_declaration_order() {
        let mut classes = vec![
            ViolationClass::Smoking,
            ViolationClass::Sleeping,
            ViolationClass::PhoneUse,
        ];
        classes.sort();
        assert_eq!(
            classes,
            vec![
                ViolationClass::Sleeping,
                ViolationClass::PhoneUse,
                ViolationClass::Smoking
            ]
        );
    }
}
