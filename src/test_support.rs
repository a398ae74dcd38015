//! Fakes for the outbound ports, shared by unit tests.

use crate::domain::errors::{ErrorKind, RequestError};
use crate::domain::ports::{
    Delay, InferenceTransport, OutboundRequest, TransportResponse, UniformSource,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

pub(crate) type Reply = Result<TransportResponse, RequestError>;

#[derive(Default)]
struct Route {
    queued: VecDeque<Reply>,
    fallback: Option<Reply>,
}

/// Transport answering from per-URL scripts and recording every call.
///
/// Queued replies are consumed first, then the URL's fallback repeats.
/// URLs without a script are refused.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<Vec<OutboundRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn always(&self, url: impl Into<String>, reply: Reply) {
        self.routes.lock().entry(url.into()).or_default().fallback = Some(reply);
    }

    pub fn then(&self, url: impl Into<String>, reply: Reply) {
        self.routes.lock().entry(url.into()).or_default().queued.push_back(reply);
    }

    pub fn calls(&self) -> Vec<OutboundRequest> {
        self.calls.lock().clone()
    }

    pub fn call_urls(&self) -> Vec<String> {
        self.calls.lock().iter().map(|r| r.url.clone()).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl InferenceTransport for ScriptedTransport {
    async fn execute(&self, request: &OutboundRequest) -> Result<TransportResponse, RequestError> {
        self.calls.lock().push(request.clone());

        let mut routes = self.routes.lock();
        let Some(route) = routes.get_mut(&request.url) else {
            return refused();
        };
        if let Some(reply) = route.queued.pop_front() {
            return reply;
        }
        route.fallback.clone().unwrap_or_else(refused)
    }
}

/// Delay that records requested durations and returns immediately.
#[derive(Default)]
pub(crate) struct RecordingDelay {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingDelay {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().clone()
    }
}

#[async_trait]
impl Delay for RecordingDelay {
    async fn wait(&self, duration: Duration) {
        self.waits.lock().push(duration);
    }
}

/// Uniform source replaying fixed draws, cycling when exhausted.
pub(crate) struct SequenceSource {
    draws: Vec<f64>,
    next: usize,
}

impl SequenceSource {
    pub fn new(draws: Vec<f64>) -> Self {
        Self { draws, next: 0 }
    }
}

impl UniformSource for SequenceSource {
    fn next_unit(&mut self) -> f64 {
        let value = self.draws[self.next % self.draws.len()];
        self.next += 1;
        value
    }
}

pub(crate) fn json_reply(status: u16, body: serde_json::Value) -> Reply {
    Ok(TransportResponse { status, body })
}

pub(crate) fn online_info() -> Reply {
    json_reply(
        200,
        serde_json::json!({
            "status": "online",
            "model_name": "retinopathy-efficientnet",
            "classes": ["No DR", "Mild", "Moderate", "Severe", "Proliferative DR"],
            "api_version": "1.2.0",
            "simulation_mode_enabled": false
        }),
    )
}

pub(crate) fn refused() -> Reply {
    Err(RequestError::new(ErrorKind::ConnectionRefused, "connection refused"))
}

pub(crate) fn timed_out() -> Reply {
    Err(RequestError::new(ErrorKind::Timeout, "operation timed out"))
}
