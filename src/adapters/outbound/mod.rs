mod reqwest_transport;
mod std_rng_source;
mod tokio_delay;

pub use reqwest_transport::{classify_error, ReqwestTransport};
pub use std_rng_source::StdRngSource;
pub use tokio_delay::TokioDelay;
