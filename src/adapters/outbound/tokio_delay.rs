//! Tokio Delay
//!
//! Backoff waits on the tokio timer.

use crate::domain::ports::Delay;
use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
