//! Infrastructure Layer
//!
//! Request retry, endpoint health probing and shutdown coordination.

pub mod health_prober;
pub mod retry_client;
pub mod shutdown;

pub use health_prober::{HealthProber, ProberConfig};
pub use retry_client::{RetryClient, RetryPolicy};
pub use shutdown::{shutdown_signal, ShutdownController};
