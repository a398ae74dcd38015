//! Retry-Wrapped Request Client
//!
//! Every call to the inference service goes through this client so the
//! retry policy is uniform: bounded attempts, linear backoff, and only
//! transient failures are retried.

use crate::domain::entities::RetryState;
use crate::domain::errors::{ErrorKind, RequestError};
use crate::domain::ports::{Delay, InferenceTransport, OutboundRequest, TransportResponse};
use std::sync::Arc;
use std::time::Duration;

/// Retry policy configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Attempt N waits `base_delay × N` before the next attempt
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Policy for one-shot calls such as diagnostic sweeps.
    pub fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}

/// Request client with bounded retry.
#[derive(Clone)]
pub struct RetryClient {
    transport: Arc<dyn InferenceTransport>,
    delay: Arc<dyn Delay>,
    policy: RetryPolicy,
}

impl RetryClient {
    pub fn new(
        transport: Arc<dyn InferenceTransport>,
        delay: Arc<dyn Delay>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            delay,
            policy,
        }
    }

    /// Same transport and delay, different policy.
    pub fn with_policy(&self, policy: RetryPolicy) -> Self {
        Self {
            policy,
            ..self.clone()
        }
    }

    /// Send a request, retrying transient failures.
    ///
    /// Non-2xx answers become errors: 5xx is retried, 4xx fails at once.
    pub async fn send(&self, request: &OutboundRequest) -> Result<TransportResponse, RequestError> {
        self.send_with(request, Ok).await
    }

    /// Send a request and validate each 2xx answer with `validate`.
    ///
    /// A validation error counts as a failed attempt and is retried when
    /// its kind is retryable.
    pub async fn send_with<T, F>(
        &self,
        request: &OutboundRequest,
        validate: F,
    ) -> Result<T, RequestError>
    where
        F: Fn(TransportResponse) -> Result<T, RequestError>,
    {
        let mut state = RetryState::new(self.policy.max_attempts);

        loop {
            let attempt = state.begin_attempt();

            let result = match self.transport.execute(request).await {
                Ok(response) => classify_status(response).and_then(&validate),
                Err(err) => Err(err),
            };

            match result {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::debug!("{} succeeded on attempt {}", request.url, attempt);
                    }
                    return Ok(value);
                }
                Err(err) if err.kind.is_retryable() && state.can_retry() => {
                    let wait = state.schedule_retry(self.policy.base_delay);
                    tracing::debug!(
                        "attempt {}/{} to {} failed ({}), retrying in {}ms",
                        attempt,
                        state.max_attempts,
                        request.url,
                        err,
                        state.delay_ms
                    );
                    self.delay.wait(wait).await;
                }
                Err(err) => {
                    tracing::debug!(
                        "giving up on {} after {} attempt(s): {}",
                        request.url,
                        attempt,
                        err
                    );
                    return Err(err);
                }
            }
        }
    }
}

/// Turn a non-2xx answer into the matching error kind.
fn classify_status(response: TransportResponse) -> Result<TransportResponse, RequestError> {
    let status = response.status;
    let kind = match status {
        200..=299 => return Ok(response),
        500..=599 => ErrorKind::ServerError(status),
        400..=499 => ErrorKind::ClientError(status),
        _ => ErrorKind::UnexpectedResponse,
    };
    Err(RequestError::new(kind, error_detail(&response.body, status)))
}

/// Best human-readable detail from an error body.
fn error_detail(body: &serde_json::Value, status: u16) -> String {
    let detail = match body {
        serde_json::Value::String(text) if !text.is_empty() => Some(text.clone()),
        serde_json::Value::Object(map) => ["error", "message", "detail"]
            .iter()
            .find_map(|key| map.get(*key))
            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string())),
        _ => None,
    };
    detail.unwrap_or_else(|| format!("HTTP {}", status))
}
