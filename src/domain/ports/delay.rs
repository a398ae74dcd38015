//! Delay Port
//!
//! Defines how the request client waits between attempts.

use async_trait::async_trait;
use std::time::Duration;

/// Waits out a backoff interval.
///
/// Production code sleeps on the tokio timer; tests record the requested
/// durations instead of sleeping.
#[async_trait]
pub trait Delay: Send + Sync {
    async fn wait(&self, duration: Duration);
}
