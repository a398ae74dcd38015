//! RetinaScan Inference Gateway Library
//!
//! Retry and failover client for the retinopathy inference service, with a
//! simulation fallback so screening never blocks on an unavailable model.
//! Exposed as a library for integration tests.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use application::{Analysis, AnalysisService, PredictionInvoker};
pub use config::{load_config, Config};
pub use domain::entities::{EndpointCandidate, EndpointStatus, ImageInput, PredictionResult};
pub use domain::errors::{ErrorKind, InferenceError, RequestError};
pub use domain::services::EndpointRegistry;
pub use domain::value_objects::SeverityClass;
pub use infrastructure::{HealthProber, RetryClient, RetryPolicy, ShutdownController};
