//! Domain Errors
//!
//! Failure taxonomy shared by the request client, the health prober and
//! the prediction invoker.

use serde::Serialize;
use std::path::PathBuf;

/// Classification of a failed outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// TCP connection actively refused
    ConnectionRefused,
    /// Host name did not resolve
    DnsNotFound,
    /// Call exceeded its deadline
    Timeout,
    /// Remote answered 5xx
    ServerError(u16),
    /// Remote answered 4xx
    ClientError(u16),
    /// Image payload rejected locally before sending
    MalformedPayload,
    /// 2xx answer whose body does not have the expected shape
    UnexpectedResponse,
    /// 2xx info answer without the online marker, as served while the model loads
    ServiceNotReady,
    /// Any other transport failure
    Network,
    /// Every configured endpoint failed its probe
    AllEndpointsExhausted,
}

impl ErrorKind {
    /// Whether the request client may spend another attempt on this failure.
    ///
    /// A not-ready info answer is retried: a sleeping hosted space answers
    /// with a placeholder page until the model process is up. Any other
    /// wrong-shape 2xx is final.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionRefused
                | Self::DnsNotFound
                | Self::Timeout
                | Self::ServerError(_)
                | Self::ServiceNotReady
        )
    }

    /// HTTP status carried by the failure, if the remote answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ServerError(code) | Self::ClientError(code) => Some(*code),
            _ => None,
        }
    }

    /// Message suitable for showing to a clinician next to a simulated result.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::ClientError(422) | Self::MalformedPayload => {
                "Invalid image format. Make sure the image is a supported format (JPEG/PNG)."
            }
            Self::Timeout => {
                "The inference service timed out. It may be busy or unavailable."
            }
            Self::ConnectionRefused => {
                "Cannot connect to the inference service. It may be down."
            }
            Self::DnsNotFound => "The inference service host could not be resolved.",
            Self::AllEndpointsExhausted => {
                "No inference service endpoint is reachable. A simulated result was used."
            }
            _ => "The inference service could not process the image.",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionRefused => write!(f, "connection refused"),
            Self::DnsNotFound => write!(f, "dns not found"),
            Self::Timeout => write!(f, "timeout"),
            Self::ServerError(code) => write!(f, "server error ({})", code),
            Self::ClientError(code) => write!(f, "client error ({})", code),
            Self::MalformedPayload => write!(f, "malformed payload"),
            Self::UnexpectedResponse => write!(f, "unexpected response"),
            Self::ServiceNotReady => write!(f, "service not ready"),
            Self::Network => write!(f, "network error"),
            Self::AllEndpointsExhausted => write!(f, "all endpoints exhausted"),
        }
    }
}

/// Failure of a single outbound request after the retry policy gave up.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct RequestError {
    pub kind: ErrorKind,
    pub message: String,
}

impl RequestError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Failure of a prediction call.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("malformed image payload: {0}")]
    MalformedPayload(String),

    #[error("no image file or inline image data supplied")]
    MissingImage,

    #[error("cannot read image file {path}: {source}")]
    FileUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("inference request failed: {0}")]
    Request(#[from] RequestError),

    #[error("all inference endpoints are unavailable")]
    AllEndpointsExhausted,
}

impl InferenceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedPayload(_) | Self::MissingImage | Self::FileUnavailable { .. } => {
                ErrorKind::MalformedPayload
            }
            Self::Request(err) => err.kind,
            Self::AllEndpointsExhausted => ErrorKind::AllEndpointsExhausted,
        }
    }
}

/// Invalid startup configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("no inference endpoints configured")]
    NoEndpoints,
}
