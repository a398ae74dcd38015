//! Reqwest Inference Transport
//!
//! Implements InferenceTransport over a shared reqwest client and maps
//! transport failures onto the domain error kinds.

use crate::domain::errors::{ErrorKind, RequestError};
use crate::domain::ports::{
    HttpMethod, InferenceTransport, OutboundRequest, RequestBody, TransportResponse,
};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::error::Error as StdError;

/// HTTP transport backed by reqwest.
///
/// Timeouts are set per request, so one client serves both probes and
/// predictions.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with a default client.
    pub fn new() -> Result<Self, RequestError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("retinascan-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RequestError::new(ErrorKind::Network, format!("client error: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl InferenceTransport for ReqwestTransport {
    async fn execute(&self, request: &OutboundRequest) -> Result<TransportResponse, RequestError> {
        let builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        }
        .timeout(request.timeout);

        let builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(body),
            RequestBody::MultipartFile {
                file_name,
                mime_type,
                bytes,
            } => {
                let part = Part::bytes(bytes.to_vec())
                    .file_name(file_name.clone())
                    .mime_str(mime_type)
                    .map_err(classify_error)?;
                builder.multipart(Form::new().part("file", part))
            }
        };

        let response = builder.send().await.map_err(classify_error)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(classify_error)?;
        let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));

        Ok(TransportResponse { status, body })
    }
}

/// Map a reqwest failure onto the domain error kinds.
pub fn classify_error(err: reqwest::Error) -> RequestError {
    let kind = if err.is_timeout() {
        ErrorKind::Timeout
    } else if err.is_connect() {
        connect_failure_kind(&err)
    } else {
        ErrorKind::Network
    };
    RequestError::new(kind, describe(&err))
}

/// Distinguish resolution failures from refused connections.
fn connect_failure_kind(err: &reqwest::Error) -> ErrorKind {
    let mut source: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::ConnectionRefused {
                return ErrorKind::ConnectionRefused;
            }
        }
        let text = cause.to_string().to_lowercase();
        if text.contains("dns error") || text.contains("failed to lookup address") {
            return ErrorKind::DnsNotFound;
        }
        if text.contains("timed out") {
            return ErrorKind::Timeout;
        }
        source = cause.source();
    }
    ErrorKind::ConnectionRefused
}

/// Error text including its causes.
fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_refused_connection_is_classified() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let transport = ReqwestTransport::new().unwrap();
        let request =
            OutboundRequest::get(format!("http://127.0.0.1:{}/", port), Duration::from_secs(2));

        let err = transport.execute(&request).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ConnectionRefused);
    }

    #[tokio::test]
    async fn test_unresolvable_host_is_classified() {
        let transport = ReqwestTransport::new().unwrap();
        let request = OutboundRequest::get("http://retinascan.invalid/", Duration::from_secs(5));

        let err = transport.execute(&request).await.unwrap_err();
        assert!(
            matches!(err.kind, ErrorKind::DnsNotFound | ErrorKind::Timeout),
            "unexpected kind {:?}",
            err.kind
        );
    }
}
