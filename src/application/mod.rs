//! Application Layer
//!
//! Use cases composed from domain services and infrastructure.

mod analysis_service;
mod prediction_invoker;

pub use analysis_service::{Analysis, AnalysisService};
pub use prediction_invoker::{strip_data_url, validate_base64_prefix, PredictionInvoker};
