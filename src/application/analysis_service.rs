//! Analysis Service
//!
//! Turns a retina image into a screening analysis. A remote prediction is
//! preferred; when it fails for any reason a simulated result is returned
//! instead, flagged as such and annotated with a user-facing message.

use crate::application::PredictionInvoker;
use crate::domain::entities::{ImageInput, PredictionResult};
use crate::domain::ports::UniformSource;
use crate::domain::services::simulate;
use crate::domain::value_objects::SeverityClass;
use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

/// A completed screening analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub analysis_id: Uuid,
    pub result: PredictionResult,
    /// Human-readable severity label
    pub severity: &'static str,
    /// 0 (no DR) through 4 (proliferative DR)
    pub severity_level: u8,
    pub recommendation: &'static str,
    pub is_simulation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Analysis {
    fn from_result(result: PredictionResult, error_message: Option<String>) -> Self {
        let class: SeverityClass = result.class_label;
        Self {
            analysis_id: Uuid::new_v4(),
            severity: class.label(),
            severity_level: class.severity_level(),
            recommendation: class.recommendation(),
            is_simulation: result.is_simulation,
            result,
            error_message,
        }
    }
}

pub struct AnalysisService {
    invoker: PredictionInvoker,
    random: Mutex<Box<dyn UniformSource>>,
}

impl AnalysisService {
    pub fn new(invoker: PredictionInvoker, random: Box<dyn UniformSource>) -> Self {
        Self {
            invoker,
            random: Mutex::new(random),
        }
    }

    /// Analyze an image. Never fails: errors degrade to a simulated result.
    pub async fn analyze(&self, image: &ImageInput) -> Analysis {
        match self.invoker.predict(image).await {
            Ok(result) => Analysis::from_result(result, None),
            Err(err) => {
                let kind = err.kind();
                tracing::warn!("prediction failed ({}), using simulated result: {}", kind, err);
                let result = simulate(&mut **self.random.lock());
                Analysis::from_result(result, Some(kind.user_message().to_string()))
            }
        }
    }
}
