//! Inference Gateway API Server
//!
//! HTTP API consumed by the screening backend: service health, inference
//! endpoint status, the multi-endpoint diagnostic sweep and image analysis.

use crate::application::{AnalysisService, PredictionInvoker};
use crate::domain::entities::{EndpointDiagnostic, ServiceInfo};
use crate::domain::services::diagnostics::recommendations;
use crate::infrastructure::{HealthProber, ShutdownController};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Analysis request. At least one field must be present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub image_data: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
}

/// Query of the status route.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusQuery {
    #[serde(default)]
    pub full_test: bool,
}

/// Caller-facing inference status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub available: bool,
    pub simulation: bool,
    pub last_check: Option<u64>,
    pub info: Option<ServiceInfo>,
    pub api_url: String,
    pub info_url: String,
    pub detailed_test: Option<Vec<EndpointDiagnostic>>,
}

/// Result of the diagnostic sweep.
#[derive(Debug, Serialize)]
pub struct EndpointsResponse {
    pub results: Vec<EndpointDiagnostic>,
    pub recommendations: Vec<String>,
}

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub endpoints: usize,
}

/// API Server state.
#[derive(Clone)]
pub struct ApiState {
    pub prober: Arc<HealthProber>,
    pub analysis: Arc<AnalysisService>,
}

impl ApiState {
    pub fn new(prober: Arc<HealthProber>, analysis: Arc<AnalysisService>) -> Self {
        Self { prober, analysis }
    }
}

/// Build the gateway router over `state`.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/inference/status", get(status_handler))
        .route("/api/v1/inference/endpoints", get(endpoints_handler))
        .route("/api/v1/inference/analyze", post(analyze_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API Server for the inference gateway.
pub struct ApiServer {
    listen_addr: String,
    state: ApiState,
}

impl ApiServer {
    pub fn new(listen_addr: String, state: ApiState) -> Self {
        Self { listen_addr, state }
    }

    /// Run the API server until `shutdown` fires.
    #[cfg_attr(coverage_nightly, coverage(off))]
    pub async fn run(&self, shutdown: ShutdownController) -> anyhow::Result<()> {
        let app = router(self.state.clone());

        let listener = TcpListener::bind(&self.listen_addr).await?;
        tracing::info!("inference gateway API listening on {}", self.listen_addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;
        tracing::info!("inference gateway API stopped");
        Ok(())
    }
}

// Handler functions

async fn health_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: state.prober.candidates().await.len(),
    };
    Json(response)
}

async fn status_handler(
    State(state): State<ApiState>,
    Query(query): Query<StatusQuery>,
) -> impl IntoResponse {
    let status = state.prober.check_status(false).await;

    let detailed_test = if query.full_test {
        tracing::info!("running full inference endpoint test");
        Some(state.prober.diagnose().await)
    } else {
        None
    };

    let endpoint = status.active_endpoint();
    Json(StatusResponse {
        available: status.available,
        simulation: status.simulation_active,
        last_check: status.last_check,
        info: status.last_info,
        api_url: endpoint.predict_url(),
        info_url: endpoint.info_url(),
        detailed_test,
    })
}

async fn endpoints_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let results = state.prober.diagnose().await;
    let recommendations = recommendations(&results);
    Json(EndpointsResponse {
        results,
        recommendations,
    })
}

async fn analyze_handler(
    State(state): State<ApiState>,
    Json(req): Json<AnalyzeRequest>,
) -> impl IntoResponse {
    let image = match PredictionInvoker::image_input(req.image_data, req.file_path) {
        Ok(image) => image,
        Err(err) => {
            tracing::debug!("rejected analysis request: {}", err);
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": err.to_string() })),
            );
        }
    };

    let analysis = state.analysis.analyze(&image).await;
    tracing::info!(
        "analysis {}: {} (simulation: {})",
        analysis.analysis_id,
        analysis.severity,
        analysis.is_simulation
    );

    match serde_json::to_value(&analysis) {
        Ok(body) => (StatusCode::CREATED, Json(body)),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        ),
    }
}
