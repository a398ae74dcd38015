//! RetinaScan Inference Gateway
//!
//! This is the composition root that wires together all the components.

use retinascan_gateway::adapters::inbound::{ApiServer, ApiState};
use retinascan_gateway::adapters::outbound::{ReqwestTransport, StdRngSource, TokioDelay};
use retinascan_gateway::application::{AnalysisService, PredictionInvoker};
use retinascan_gateway::config::load_config;
use retinascan_gateway::domain::services::EndpointRegistry;
use retinascan_gateway::infrastructure::{
    shutdown_signal, HealthProber, RetryClient, ShutdownController,
};
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment
    let cfg = load_config()?;

    // Setup logging
    let log_level = if cfg.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    let registry = EndpointRegistry::new(cfg.endpoint_urls())?;
    tracing::info!(
        "starting retinascan-gateway listen={} endpoints={}",
        cfg.listen_addr,
        registry.len()
    );

    // ===== COMPOSITION ROOT =====

    // 1. Outbound adapters
    let transport = Arc::new(ReqwestTransport::new()?);
    let client = RetryClient::new(transport, Arc::new(TokioDelay), cfg.retry_policy());

    // 2. Endpoint health
    let prober = Arc::new(HealthProber::new(
        cfg.prober_config(),
        registry,
        client.clone(),
    ));

    // 3. Application services
    let invoker = PredictionInvoker::new(prober.clone(), client, cfg.predict_timeout());
    let analysis = Arc::new(AnalysisService::new(
        invoker,
        Box::new(StdRngSource::from_entropy()),
    ));

    // 4. Shutdown and background probing
    let shutdown = ShutdownController::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));
    let probe_loop = prober.start(shutdown.clone());

    // 5. Inbound adapter
    let server = ApiServer::new(cfg.listen_addr.clone(), ApiState::new(prober, analysis));
    server.run(shutdown.clone()).await?;

    shutdown.shutdown();
    if let Err(e) = probe_loop.await {
        tracing::error!("probe loop ended abnormally: {}", e);
    }
    Ok(())
}
