use crate::infrastructure::{ProberConfig, RetryPolicy};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_INFERENCE_URL: &str = "https://fadhlirajwaa-retinascan-api.hf.space";

pub const DEFAULT_FALLBACK_URLS: [&str; 4] = [
    DEFAULT_INFERENCE_URL,
    "http://localhost:5001",
    "http://localhost:5000",
    "http://127.0.0.1:5000",
];

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    // Gateway API
    pub listen_addr: String,
    pub debug: bool,

    // Inference endpoints
    pub inference_url: String,
    pub fallback_urls: Vec<String>,

    // Probing
    pub probe_timeout_secs: u64,
    pub status_cache_secs: u64,
    pub probe_interval_secs: u64,

    // Prediction and retry
    pub predict_timeout_secs: u64,
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            debug: false,
            inference_url: DEFAULT_INFERENCE_URL.to_string(),
            fallback_urls: DEFAULT_FALLBACK_URLS.iter().map(|s| s.to_string()).collect(),
            probe_timeout_secs: 20,
            status_cache_secs: 60,
            probe_interval_secs: 300,
            predict_timeout_secs: 60,
            retry_max_attempts: 3,
            retry_base_delay_ms: 1000,
        }
    }
}

impl Config {
    /// Candidate URLs in preference order: primary first, then fallbacks.
    pub fn endpoint_urls(&self) -> Vec<String> {
        std::iter::once(&self.inference_url)
            .chain(self.fallback_urls.iter())
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .collect()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_max_attempts.max(1),
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
        }
    }

    pub fn prober_config(&self) -> ProberConfig {
        ProberConfig {
            probe_timeout: Duration::from_secs(self.probe_timeout_secs),
            cache_ttl: Duration::from_secs(self.status_cache_secs),
            probe_interval: Duration::from_secs(self.probe_interval_secs.max(1)),
        }
    }

    pub fn predict_timeout(&self) -> Duration {
        Duration::from_secs(self.predict_timeout_secs)
    }
}

pub fn load_config() -> anyhow::Result<Config> {
    Ok(config_from(|key| std::env::var(key).ok()))
}

/// Build a config from a variable lookup.
fn config_from(var: impl Fn(&str) -> Option<String>) -> Config {
    let defaults = Config::default();

    let listen_addr = var("RETINASCAN_LISTEN_ADDR").unwrap_or(defaults.listen_addr);

    let debug = var("DEBUG").is_some();

    let inference_url = var("RETINASCAN_INFERENCE_URL")
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or(defaults.inference_url);

    let fallback_urls = var("RETINASCAN_FALLBACK_URLS")
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().trim_end_matches('/').to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or(defaults.fallback_urls);

    let probe_timeout_secs = var("RETINASCAN_PROBE_TIMEOUT_SECS")
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.probe_timeout_secs);

    let status_cache_secs = var("RETINASCAN_STATUS_CACHE_SECS")
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.status_cache_secs);

    let probe_interval_secs = var("RETINASCAN_PROBE_INTERVAL_SECS")
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.probe_interval_secs);

    let predict_timeout_secs = var("RETINASCAN_PREDICT_TIMEOUT_SECS")
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.predict_timeout_secs);

    let retry_max_attempts = var("RETINASCAN_RETRY_MAX_ATTEMPTS")
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.retry_max_attempts);

    let retry_base_delay_ms = var("RETINASCAN_RETRY_BASE_DELAY_MS")
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.retry_base_delay_ms);

    Config {
        listen_addr,
        debug,
        inference_url,
        fallback_urls,
        probe_timeout_secs,
        status_cache_secs,
        probe_interval_secs,
        predict_timeout_secs,
        retry_max_attempts,
        retry_base_delay_ms,
    }
}
