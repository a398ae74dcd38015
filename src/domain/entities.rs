//! Domain Entities - Core business objects
//!
//! These entities represent the core concepts of the inference gateway.
//! They have no I/O and contain only business logic.

use crate::domain::errors::{ErrorKind, RequestError};
use crate::domain::value_objects::SeverityClass;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::Instant;

/// One configured base URL of the inference service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointCandidate {
    /// Base URL without trailing slash
    pub base_url: String,
}

impl EndpointCandidate {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        }
    }

    /// Info route used for probing.
    pub fn info_url(&self) -> String {
        format!("{}/", self.base_url)
    }

    /// Multipart file prediction route.
    pub fn predict_url(&self) -> String {
        format!("{}/predict", self.base_url)
    }

    /// Inline (base64) prediction route.
    pub fn predict_inline_url(&self) -> String {
        format!("{}/predict-base64", self.base_url)
    }
}

impl std::fmt::Display for EndpointCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.base_url)
    }
}

/// Payload of the inference service info route.
///
/// Known fields are read leniently: a value of an unexpected type reads as
/// absent rather than failing the whole payload. Anything else the service
/// reports is kept verbatim so status queries can relay it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub simulation_mode_enabled: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub model_loaded: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Read a field as `T`, or `None` when it has another type.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl ServiceInfo {
    /// Marker values the service uses to announce it is serving.
    pub const ONLINE_STATUS: &'static str = "online";
    pub const SERVICE_NAME: &'static str = "retinopathy-api";

    pub fn is_online(&self) -> bool {
        self.status.as_deref() == Some(Self::ONLINE_STATUS)
            || self.service.as_deref() == Some(Self::SERVICE_NAME)
    }

    /// Whether the remote reports it is answering with its own simulated model.
    pub fn simulation_mode(&self) -> bool {
        self.simulation_mode_enabled.unwrap_or(false)
    }
}

/// Recorded failure of the last probe cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeFailure {
    pub kind: ErrorKind,
    pub message: String,
    /// Unix time in milliseconds
    pub timestamp: u64,
}

/// Availability of the inference service as last observed by the prober.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointStatus {
    /// Index of the preferred candidate in the registry
    pub active_index: usize,
    /// Base URL of the preferred candidate
    pub active_url: String,
    pub available: bool,
    /// True when predictions will be (or are being) simulated
    pub simulation_active: bool,
    /// Monotonic probe time, used for cache freshness
    #[serde(skip)]
    pub last_checked_at: Option<Instant>,
    /// Unix time in milliseconds of the last probe
    pub last_check: Option<u64>,
    pub last_info: Option<ServiceInfo>,
    pub last_error: Option<ProbeFailure>,
    pub consecutive_failure_count: u32,
}

impl EndpointStatus {
    /// Status before any probe has run.
    pub fn unchecked(active_index: usize, active: &EndpointCandidate) -> Self {
        Self {
            active_index,
            active_url: active.base_url.clone(),
            available: false,
            simulation_active: false,
            last_checked_at: None,
            last_check: None,
            last_info: None,
            last_error: None,
            consecutive_failure_count: 0,
        }
    }

    /// Whether this status is young enough to answer without probing.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.last_checked_at
            .map(|at| at.elapsed() < ttl)
            .unwrap_or(false)
    }

    /// Candidate the status points at.
    pub fn active_endpoint(&self) -> EndpointCandidate {
        EndpointCandidate::new(self.active_url.clone())
    }
}

/// Outcome of probing a single endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Online(ServiceInfo),
    Failed(RequestError),
}

/// Result of one candidate in a diagnostic sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDiagnostic {
    pub url: String,
    pub success: bool,
    pub response_time_ms: u64,
    pub status_code: Option<u16>,
    pub error_kind: Option<ErrorKind>,
    pub error: Option<String>,
    pub info: Option<ServiceInfo>,
}

/// A classification produced by the remote model or the simulation fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    #[serde(rename = "class")]
    pub class_label: SeverityClass,
    /// In [0, 1]
    pub confidence: f64,
    pub is_simulation: bool,
}

/// Reference to an image already stored on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub path: PathBuf,
}

impl FileRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File name sent in the multipart part.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image.jpg".to_string())
    }

    /// MIME type guessed from the extension.
    pub fn mime_type(&self) -> &'static str {
        let ext = self
            .path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            _ => "application/octet-stream",
        }
    }
}

/// Image embedded in the request as a `data:<mime>;base64,<payload>` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImagePayload(pub String);

/// Image handed to the prediction invoker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageInput {
    File(FileRef),
    Inline(InlineImagePayload),
}

/// Per-call retry bookkeeping. Never outlives the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryState {
    pub attempt_count: u32,
    pub max_attempts: u32,
    /// Delay scheduled before the next attempt
    pub delay_ms: u64,
}

impl RetryState {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempt_count: 0,
            max_attempts: max_attempts.max(1),
            delay_ms: 0,
        }
    }

    pub fn begin_attempt(&mut self) -> u32 {
        self.attempt_count += 1;
        self.attempt_count
    }

    pub fn can_retry(&self) -> bool {
        self.attempt_count < self.max_attempts
    }

    /// Linear backoff: attempt N waits `base × N`.
    pub fn schedule_retry(&mut self, base: Duration) -> Duration {
        let delay = base.saturating_mul(self.attempt_count);
        self.delay_ms = delay.as_millis() as u64;
        delay
    }
}

/// Current wall-clock time in Unix milliseconds.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_trims_trailing_slash() {
        let c = EndpointCandidate::new("http://localhost:5000/ ");
        assert_eq!(c.base_url, "http://localhost:5000");
        assert_eq!(c.info_url(), "http://localhost:5000/");
        assert_eq!(c.predict_url(), "http://localhost:5000/predict");
        assert_eq!(c.predict_inline_url(), "http://localhost:5000/predict-base64");
    }

    #[test]
    fn test_service_info_online_markers() {
        let by_status: ServiceInfo =
            serde_json::from_value(serde_json::json!({ "status": "online" })).unwrap();
        assert!(by_status.is_online());

        let by_service: ServiceInfo =
            serde_json::from_value(serde_json::json!({ "service": "retinopathy-api" })).unwrap();
        assert!(by_service.is_online());

        let neither: ServiceInfo =
            serde_json::from_value(serde_json::json!({ "status": "starting" })).unwrap();
        assert!(!neither.is_online());
    }

    #[test]
    fn test_service_info_keeps_unknown_fields() {
        let info: ServiceInfo = serde_json::from_value(serde_json::json!({
            "status": "online",
            "model_name": "efficientnet-b3",
            "simulation_mode_enabled": true,
            "tf_version": "2.15.0"
        }))
        .unwrap();

        assert!(info.simulation_mode());
        assert_eq!(info.model_name.as_deref(), Some("efficientnet-b3"));
        assert_eq!(info.extra["tf_version"], "2.15.0");

        let back = serde_json::to_value(&info).unwrap();
        assert_eq!(back["tf_version"], "2.15.0");
        assert!(back.get("classes").is_none());
    }

    #[test]
    fn test_service_info_tolerates_mistyped_fields() {
        let info: ServiceInfo = serde_json::from_value(serde_json::json!({
            "status": "online",
            "api_version": 1.0,
            "classes": { "0": "No DR", "1": "Mild" },
            "simulation_mode_enabled": "no",
            "model_name": "efficientnet-b3"
        }))
        .unwrap();

        assert!(info.is_online());
        assert_eq!(info.api_version, None);
        assert_eq!(info.classes, None);
        assert!(!info.simulation_mode());
        assert_eq!(info.model_name.as_deref(), Some("efficientnet-b3"));
    }

    #[test]
    fn test_unchecked_status_is_never_fresh() {
        let status = EndpointStatus::unchecked(0, &EndpointCandidate::new("http://a"));
        assert!(!status.available);
        assert!(!status.simulation_active);
        assert!(!status.is_fresh(Duration::from_secs(60)));
    }

    #[test]
    fn test_prediction_result_wire_shape() {
        let result = PredictionResult {
            class_label: SeverityClass::Mild,
            confidence: 0.91,
            is_simulation: false,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["class"], "Mild");
        assert_eq!(json["isSimulation"], false);
    }

    #[test]
    fn test_file_ref_metadata() {
        let f = FileRef::new("/uploads/retina-01.JPG");
        assert_eq!(f.file_name(), "retina-01.JPG");
        assert_eq!(f.mime_type(), "image/jpeg");
        assert_eq!(FileRef::new("scan.png").mime_type(), "image/png");
        assert_eq!(FileRef::new("scan.bin").mime_type(), "application/octet-stream");
    }

    #[test]
    fn test_retry_state_linear_backoff() {
        let base = Duration::from_millis(1000);
        let mut state = RetryState::new(3);

        assert_eq!(state.begin_attempt(), 1);
        assert!(state.can_retry());
        assert_eq!(state.schedule_retry(base), Duration::from_millis(1000));

        assert_eq!(state.begin_attempt(), 2);
        assert_eq!(state.schedule_retry(base), Duration::from_millis(2000));
        assert_eq!(state.delay_ms, 2000);

        assert_eq!(state.begin_attempt(), 3);
        assert!(!state.can_retry());
    }

    #[test]
    fn test_retry_state_allows_at_least_one_attempt() {
        let mut state = RetryState::new(0);
        assert_eq!(state.max_attempts, 1);
        state.begin_attempt();
        assert!(!state.can_retry());
    }
}
