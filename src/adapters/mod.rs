//! Adapters Layer
//!
//! Inbound adapters drive the application (HTTP API); outbound adapters
//! implement the domain ports (HTTP transport, timers, randomness).

pub mod inbound;
pub mod outbound;
