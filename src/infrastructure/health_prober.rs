//! Health Prober
//!
//! Checks whether the preferred inference endpoint is serving, failing over
//! through the registry when it is not. Results are cached so a dead service
//! is not hammered on every prediction request.

use crate::domain::entities::{
    unix_millis, EndpointCandidate, EndpointDiagnostic, EndpointStatus, ProbeFailure,
    ProbeOutcome, ServiceInfo,
};
use crate::domain::errors::{ErrorKind, RequestError};
use crate::domain::ports::{OutboundRequest, TransportResponse};
use crate::domain::services::{CycleState, EndpointRegistry, ProbeCycle};
use crate::infrastructure::retry_client::{RetryClient, RetryPolicy};
use crate::infrastructure::shutdown::ShutdownController;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Health prober configuration.
#[derive(Debug, Clone)]
pub struct ProberConfig {
    /// Timeout for each info request
    pub probe_timeout: Duration,
    /// How long a probe result answers status queries without a new probe
    pub cache_ttl: Duration,
    /// Interval of the background probe loop
    pub probe_interval: Duration,
}

impl Default for ProberConfig {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(20),
            cache_ttl: Duration::from_secs(60),
            probe_interval: Duration::from_secs(300),
        }
    }
}

/// Everything the prober owns and mutates.
struct ProberState {
    registry: EndpointRegistry,
    status: EndpointStatus,
    /// Index of the last candidate that answered online
    last_known_good: Option<usize>,
}

/// Owner of the endpoint status.
///
/// The only writer of the registry cursor and of `EndpointStatus`; every
/// other component reads snapshots.
pub struct HealthProber {
    config: ProberConfig,
    client: RetryClient,
    state: RwLock<ProberState>,
    /// Serializes probe cycles so concurrent callers share one
    probe_lock: Mutex<()>,
}

impl HealthProber {
    /// Create a prober over `registry`, sending through `client`.
    pub fn new(config: ProberConfig, registry: EndpointRegistry, client: RetryClient) -> Self {
        let status = EndpointStatus::unchecked(registry.current_index(), registry.current_endpoint());
        Self {
            config,
            client,
            state: RwLock::new(ProberState {
                registry,
                status,
                last_known_good: None,
            }),
            probe_lock: Mutex::new(()),
        }
    }

    /// Current status, probing first when the cached one is stale.
    ///
    /// With `force_refresh` a probe cycle always runs.
    pub async fn check_status(&self, force_refresh: bool) -> EndpointStatus {
        if !force_refresh {
            if let Some(cached) = self.cached_status().await {
                return cached;
            }
        }

        let _probe = self.probe_lock.lock().await;

        // Another caller may have probed while we waited.
        if !force_refresh {
            if let Some(cached) = self.cached_status().await {
                return cached;
            }
        }

        self.run_probe_cycle().await
    }

    /// Last observed status without probing.
    pub async fn status(&self) -> EndpointStatus {
        self.state.read().await.status.clone()
    }

    /// Candidate the cursor currently points at.
    pub async fn current_endpoint(&self) -> EndpointCandidate {
        self.state.read().await.registry.current_endpoint().clone()
    }

    /// All configured candidates, in preference order.
    pub async fn candidates(&self) -> Vec<EndpointCandidate> {
        self.state.read().await.registry.candidates().to_vec()
    }

    async fn cached_status(&self) -> Option<EndpointStatus> {
        let state = self.state.read().await;
        state
            .status
            .is_fresh(self.config.cache_ttl)
            .then(|| state.status.clone())
    }

    /// Probe candidates from the cursor until one answers online or all fail.
    async fn run_probe_cycle(&self) -> EndpointStatus {
        let mut registry = self.state.read().await.registry.clone();
        let mut cycle = ProbeCycle::begin(registry.current_index());
        let mut online: Option<ServiceInfo> = None;
        let mut last_failure: Option<RequestError> = None;

        while let CycleState::Probing(index) = cycle.state() {
            debug_assert_eq!(index, registry.current_index());
            let candidate = registry.current_endpoint().clone();

            match self.probe_endpoint(&candidate).await {
                ProbeOutcome::Online(info) => {
                    online = Some(info);
                    cycle = cycle.on_success();
                }
                ProbeOutcome::Failed(err) => {
                    tracing::warn!("inference endpoint {} failed its probe: {}", candidate, err);
                    last_failure = Some(err);
                    cycle = cycle.on_failure(registry.len());
                    registry.advance();
                }
            }
        }

        let mut state = self.state.write().await;
        let now = Instant::now();

        match (cycle.state(), online) {
            (CycleState::Succeeded(index), Some(info)) => {
                tracing::info!(
                    "inference endpoint {} is online (model: {}, api version: {}, simulation: {})",
                    registry.current_endpoint(),
                    info.model_name.as_deref().unwrap_or("unknown"),
                    info.api_version.as_deref().unwrap_or("unknown"),
                    info.simulation_mode()
                );
                state.last_known_good = Some(index);
                state.status.available = true;
                state.status.simulation_active = info.simulation_mode();
                state.status.last_info = Some(info);
                state.status.last_error = None;
                state.status.consecutive_failure_count = 0;
            }
            _ => {
                tracing::warn!(
                    "all {} inference endpoints unavailable after {} advances, simulation mode active",
                    registry.len(),
                    cycle.advances()
                );
                if let Some(good) = state.last_known_good {
                    registry.restore(good);
                    tracing::info!(
                        "restored cursor to last known good endpoint {}",
                        registry.current_endpoint()
                    );
                }
                let detail = last_failure
                    .map(|e| format!(" (last error: {})", e))
                    .unwrap_or_default();
                state.status.available = false;
                state.status.simulation_active = true;
                state.status.last_error = Some(ProbeFailure {
                    kind: ErrorKind::AllEndpointsExhausted,
                    message: format!("all {} inference endpoints unavailable{}", registry.len(), detail),
                    timestamp: unix_millis(),
                });
                state.status.consecutive_failure_count += 1;
            }
        }

        state.status.active_index = registry.current_index();
        state.status.active_url = registry.current_endpoint().base_url.clone();
        state.status.last_checked_at = Some(now);
        state.status.last_check = Some(unix_millis());
        state.registry = registry;

        state.status.clone()
    }

    /// Probe one candidate with the client's retry policy.
    async fn probe_endpoint(&self, candidate: &EndpointCandidate) -> ProbeOutcome {
        tracing::debug!("probing inference endpoint {}", candidate);
        let request = OutboundRequest::get(candidate.info_url(), self.config.probe_timeout);
        match self.client.send_with(&request, parse_online_info).await {
            Ok(info) => ProbeOutcome::Online(info),
            Err(err) => ProbeOutcome::Failed(err),
        }
    }

    /// Probe every candidate once, without moving the cursor.
    pub async fn diagnose(&self) -> Vec<EndpointDiagnostic> {
        let one_shot = self.client.with_policy(RetryPolicy::single_attempt());
        let mut results = Vec::new();

        for candidate in self.candidates().await {
            let request = OutboundRequest::get(candidate.info_url(), self.config.probe_timeout);
            let started = Instant::now();
            let outcome = one_shot
                .send_with(&request, |response| {
                    let status = response.status;
                    parse_online_info(response).map(|info| (status, info))
                })
                .await;
            let response_time_ms = started.elapsed().as_millis() as u64;

            let diagnostic = match outcome {
                Ok((status, info)) => EndpointDiagnostic {
                    url: candidate.base_url.clone(),
                    success: true,
                    response_time_ms,
                    status_code: Some(status),
                    error_kind: None,
                    error: None,
                    info: Some(info),
                },
                Err(err) => EndpointDiagnostic {
                    url: candidate.base_url.clone(),
                    success: false,
                    response_time_ms,
                    status_code: err.kind.status_code(),
                    error_kind: Some(err.kind),
                    error: Some(err.message),
                    info: None,
                },
            };
            tracing::debug!(
                "diagnostic {}: success={} in {}ms",
                diagnostic.url,
                diagnostic.success,
                diagnostic.response_time_ms
            );
            results.push(diagnostic);
        }

        results
    }

    /// Start the background probe loop.
    ///
    /// Probes immediately, then every `probe_interval`, until shutdown.
    #[cfg_attr(coverage_nightly, coverage(off))]
    pub fn start(self: &Arc<Self>, shutdown: ShutdownController) -> JoinHandle<()> {
        let prober = Arc::clone(self);
        let mut shutdown_rx = shutdown.subscribe();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(prober.config.probe_interval);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let status = prober.check_status(true).await;
                        tracing::debug!(
                            "periodic probe: available={} endpoint={}",
                            status.available,
                            status.active_url
                        );
                    }
                    _ = shutdown_rx.recv() => {
                        tracing::debug!("health prober stopping");
                        break;
                    }
                }
            }
        })
    }
}

/// Accept only info payloads carrying an online marker.
fn parse_online_info(response: TransportResponse) -> Result<ServiceInfo, RequestError> {
    let info: ServiceInfo = serde_json::from_value(response.body).map_err(|e| {
        RequestError::new(
            ErrorKind::ServiceNotReady,
            format!("info payload is not a JSON object: {}", e),
        )
    })?;

    if info.is_online() {
        Ok(info)
    } else {
        Err(RequestError::new(
            ErrorKind::ServiceNotReady,
            "info payload has no online status marker",
        ))
    }
}
