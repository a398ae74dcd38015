mod delay;
mod inference_transport;
mod uniform_source;

pub use delay::Delay;
pub use inference_transport::{
    HttpMethod, InferenceTransport, OutboundRequest, RequestBody, TransportResponse,
};
pub use uniform_source::UniformSource;
