mod api_server;

pub use api_server::{router, AnalyzeRequest, ApiServer, ApiState};
