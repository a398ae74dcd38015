//! Domain Services
//!
//! Pure domain logic with no I/O.

pub mod diagnostics;
pub mod endpoint_registry;
pub mod probe_cycle;
pub mod simulation;

pub use endpoint_registry::EndpointRegistry;
pub use probe_cycle::{CycleState, ProbeCycle};
pub use simulation::{classify_draw, simulate};
