//! Value Objects - Immutable domain primitives
//!
//! Value objects are identified by their value rather than identity.
//! They are immutable and can be freely shared.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Diabetic-retinopathy severity class.
///
/// The five ordinal labels are shared by the remote model and the
/// local simulation fallback. Serialized with the model's own labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeverityClass {
    #[serde(rename = "No DR")]
    NoDr,
    #[serde(rename = "Mild")]
    Mild,
    #[serde(rename = "Moderate")]
    Moderate,
    #[serde(rename = "Severe")]
    Severe,
    #[serde(rename = "Proliferative DR")]
    ProliferativeDr,
}

impl SeverityClass {
    /// All classes in ascending severity.
    pub const ALL: [SeverityClass; 5] = [
        Self::NoDr,
        Self::Mild,
        Self::Moderate,
        Self::Severe,
        Self::ProliferativeDr,
    ];

    /// Label used on the wire by the inference service.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoDr => "No DR",
            Self::Mild => "Mild",
            Self::Moderate => "Moderate",
            Self::Severe => "Severe",
            Self::ProliferativeDr => "Proliferative DR",
        }
    }

    /// Ordinal severity level, 0 (none) to 4 (proliferative).
    pub fn severity_level(&self) -> u8 {
        match self {
            Self::NoDr => 0,
            Self::Mild => 1,
            Self::Moderate => 2,
            Self::Severe => 3,
            Self::ProliferativeDr => 4,
        }
    }

    /// Follow-up advice attached to an analysis of this severity.
    pub fn recommendation(&self) -> &'static str {
        match self {
            Self::NoDr => "Routine screening once a year.",
            Self::Mild => {
                "Control blood sugar and blood pressure. Re-examine in 9-12 months."
            }
            Self::Moderate => "Consult an ophthalmologist. Re-examine in 6 months.",
            Self::Severe => {
                "Urgent referral to an ophthalmologist. Re-examine in 2-3 months."
            }
            Self::ProliferativeDr => {
                "Urgent referral to an ophthalmologist for evaluation and possible laser treatment or surgery."
            }
        }
    }
}

impl std::fmt::Display for SeverityClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Error returned when a label names no known severity class.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown severity class: {0}")]
pub struct UnknownSeverity(pub String);

impl FromStr for SeverityClass {
    type Err = UnknownSeverity;

    /// Parse a model label. Case and `_`/space separators are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "nodr" => Ok(Self::NoDr),
            "mild" => Ok(Self::Mild),
            "moderate" => Ok(Self::Moderate),
            "severe" => Ok(Self::Severe),
            "proliferativedr" | "proliferative" => Ok(Self::ProliferativeDr),
            _ => Err(UnknownSeverity(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_round_trips_through_from_str() {
        for class in SeverityClass::ALL {
            assert_eq!(class.label().parse::<SeverityClass>(), Ok(class));
        }
    }

    #[test]
    fn test_from_str_is_lenient() {
        assert_eq!("no_dr".parse::<SeverityClass>(), Ok(SeverityClass::NoDr));
        assert_eq!("  MILD ".parse::<SeverityClass>(), Ok(SeverityClass::Mild));
        assert_eq!("Proliferative_DR".parse::<SeverityClass>(), Ok(SeverityClass::ProliferativeDr));
    }

    #[test]
    fn test_from_str_unknown() {
        let err = "Catastrophic".parse::<SeverityClass>().unwrap_err();
        assert_eq!(err, UnknownSeverity("Catastrophic".to_string()));
    }

    #[test]
    fn test_severity_levels_are_ordinal() {
        let levels: Vec<u8> = SeverityClass::ALL.iter().map(|c| c.severity_level()).collect();
        assert_eq!(levels, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_serde_uses_model_labels() {
        let json = serde_json::to_string(&SeverityClass::ProliferativeDr).unwrap();
        assert_eq!(json, "\"Proliferative DR\"");

        let parsed: SeverityClass = serde_json::from_str("\"No DR\"").unwrap();
        assert_eq!(parsed, SeverityClass::NoDr);
    }

    #[test]
    fn test_recommendation_escalates() {
        assert!(SeverityClass::NoDr.recommendation().contains("once a year"));
        assert!(SeverityClass::Severe.recommendation().contains("Urgent"));
        assert!(SeverityClass::ProliferativeDr.recommendation().contains("laser"));
    }

    #[test]
    fn test_display() {
        assert_eq!(SeverityClass::Moderate.to_string(), "Moderate");
    }
}
