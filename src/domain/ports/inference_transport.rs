//! Inference Transport Port
//!
//! Defines the interface for talking HTTP to the inference service.
//! Implementations may use reqwest or a scripted fake in tests.

use crate::domain::errors::RequestError;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Body of an outbound request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    /// Single multipart part named `file`
    MultipartFile {
        file_name: String,
        mime_type: String,
        bytes: Bytes,
    },
}

/// A request to one inference service route.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub method: HttpMethod,
    pub url: String,
    pub body: RequestBody,
    pub timeout: Duration,
}

impl OutboundRequest {
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            body: RequestBody::Empty,
            timeout,
        }
    }

    pub fn post_json(url: impl Into<String>, body: serde_json::Value, timeout: Duration) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            body: RequestBody::Json(body),
            timeout,
        }
    }

    pub fn post_file(
        url: impl Into<String>,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Bytes,
        timeout: Duration,
    ) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            body: RequestBody::MultipartFile {
                file_name: file_name.into(),
                mime_type: mime_type.into(),
                bytes,
            },
            timeout,
        }
    }
}

/// Any HTTP answer, whatever its status.
///
/// Bodies that are not JSON are carried as a JSON string.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a single request.
///
/// Returns `Ok` for every HTTP answer (status classification belongs to the
/// request client) and `Err` only when no answer was received.
#[async_trait]
pub trait InferenceTransport: Send + Sync {
    async fn execute(&self, request: &OutboundRequest) -> Result<TransportResponse, RequestError>;
}
