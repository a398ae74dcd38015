//! Simulation Fallback
//!
//! Synthesizes a plausible classification when no inference endpoint is
//! reachable. The class partition follows real-world prevalence: mild
//! disease is far more common than proliferative disease.

use crate::domain::entities::PredictionResult;
use crate::domain::ports::UniformSource;
use crate::domain::value_objects::SeverityClass;

/// Upper bounds (exclusive) of each class on the unit interval.
pub const NO_DR_UPPER: f64 = 0.45;
pub const MILD_UPPER: f64 = 0.65;
pub const MODERATE_UPPER: f64 = 0.85;
pub const SEVERE_UPPER: f64 = 0.95;

pub const MIN_CONFIDENCE: f64 = 0.70;
pub const CONFIDENCE_SPAN: f64 = 0.30;

/// Largest `f64` strictly below 1.0.
const BELOW_ONE: f64 = 1.0 - f64::EPSILON / 2.0;

/// Map one uniform draw in `[0, 1)` to a severity class.
pub fn classify_draw(r: f64) -> SeverityClass {
    if r < NO_DR_UPPER {
        SeverityClass::NoDr
    } else if r < MILD_UPPER {
        SeverityClass::Mild
    } else if r < MODERATE_UPPER {
        SeverityClass::Moderate
    } else if r < SEVERE_UPPER {
        SeverityClass::Severe
    } else {
        SeverityClass::ProliferativeDr
    }
}

/// Map one uniform draw in `[0, 1)` to a confidence in `[0.70, 1.00)`.
pub fn confidence_from_draw(r: f64) -> f64 {
    (MIN_CONFIDENCE + r * CONFIDENCE_SPAN).clamp(MIN_CONFIDENCE, BELOW_ONE)
}

/// Produce a simulated prediction from two draws of `source`.
pub fn simulate(source: &mut dyn UniformSource) -> PredictionResult {
    let class_label = classify_draw(source.next_unit());
    let confidence = confidence_from_draw(source.next_unit());

    tracing::info!(
        "simulated prediction: {} with confidence {:.2}",
        class_label,
        confidence
    );

    PredictionResult {
        class_label,
        confidence,
        is_simulation: true,
    }
}
