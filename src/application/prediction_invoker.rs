//! Prediction Invoker
//!
//! Sends a retina image to the active inference endpoint. Two input modes
//! map to two routes: inline base64 data goes to `/predict-base64` as JSON,
//! a stored file goes to `/predict` as a multipart upload.

use crate::domain::entities::{FileRef, ImageInput, InlineImagePayload, PredictionResult};
use crate::domain::errors::{ErrorKind, InferenceError, RequestError};
use crate::domain::ports::{OutboundRequest, TransportResponse};
use crate::domain::value_objects::SeverityClass;
use crate::infrastructure::{HealthProber, RetryClient};
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use bytes::Bytes;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Leading characters of an inline payload decoded as a validity check.
const VALIDATION_PREFIX_LEN: usize = 100;

/// Standard alphabet, padding optional, stray trailing bits accepted.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Image ready to be sent, validated and loaded.
#[derive(Debug)]
enum PreparedImage {
    Inline(String),
    File {
        file_name: String,
        mime_type: &'static str,
        bytes: Bytes,
    },
}

/// Remote prediction payload.
#[derive(Debug, Deserialize)]
struct PredictionPayload {
    class: String,
    confidence: f64,
    #[serde(default)]
    is_simulation: Option<bool>,
}

/// Calls the inference routes of the endpoint the prober considers active.
///
/// Does not cycle endpoints itself: a failed prediction is surfaced to the
/// caller and leaves the prober's cursor alone.
pub struct PredictionInvoker {
    prober: Arc<HealthProber>,
    client: RetryClient,
    predict_timeout: Duration,
}

impl PredictionInvoker {
    pub fn new(prober: Arc<HealthProber>, client: RetryClient, predict_timeout: Duration) -> Self {
        Self {
            prober,
            client,
            predict_timeout,
        }
    }

    /// Build an image input from the two optional request fields.
    ///
    /// Inline data wins when it is a data URL; otherwise the file is used.
    pub fn image_input(
        image_data: Option<String>,
        file_path: Option<String>,
    ) -> Result<ImageInput, InferenceError> {
        match (image_data, file_path) {
            (Some(data), _) if data.starts_with("data:") => {
                Ok(ImageInput::Inline(InlineImagePayload(data)))
            }
            (_, Some(path)) if !path.trim().is_empty() => Ok(ImageInput::File(FileRef::new(path))),
            _ => Err(InferenceError::MissingImage),
        }
    }

    /// Classify an image with the remote model.
    pub async fn predict(&self, image: &ImageInput) -> Result<PredictionResult, InferenceError> {
        // Bad input is rejected before anything touches the network.
        let prepared = prepare(image).await?;

        let status = self.prober.check_status(false).await;
        if !status.available {
            return Err(InferenceError::AllEndpointsExhausted);
        }
        let endpoint = status.active_endpoint();

        let request = match prepared {
            PreparedImage::Inline(payload) => {
                tracing::debug!("predicting from inline image data via {}", endpoint);
                OutboundRequest::post_json(
                    endpoint.predict_inline_url(),
                    serde_json::json!({ "image_data": payload }),
                    self.predict_timeout,
                )
            }
            PreparedImage::File {
                file_name,
                mime_type,
                bytes,
            } => {
                tracing::debug!("predicting from uploaded file {} via {}", file_name, endpoint);
                OutboundRequest::post_file(
                    endpoint.predict_url(),
                    file_name,
                    mime_type,
                    bytes,
                    self.predict_timeout,
                )
            }
        };

        let result = self.client.send_with(&request, parse_prediction).await?;
        tracing::info!(
            "prediction from {}: {} ({:.4}, simulation: {})",
            endpoint,
            result.class_label,
            result.confidence,
            result.is_simulation
        );
        Ok(result)
    }
}

async fn prepare(image: &ImageInput) -> Result<PreparedImage, InferenceError> {
    match image {
        ImageInput::Inline(InlineImagePayload(data_url)) => {
            let payload = strip_data_url(data_url)?;
            validate_base64_prefix(payload)?;
            Ok(PreparedImage::Inline(payload.to_string()))
        }
        ImageInput::File(file) => {
            let bytes = tokio::fs::read(&file.path).await.map_err(|source| {
                InferenceError::FileUnavailable {
                    path: file.path.clone(),
                    source,
                }
            })?;
            Ok(PreparedImage::File {
                file_name: file.file_name(),
                mime_type: file.mime_type(),
                bytes: Bytes::from(bytes),
            })
        }
    }
}

/// Return the base64 part of a `data:<mime>;base64,<payload>` URL.
pub fn strip_data_url(data_url: &str) -> Result<&str, InferenceError> {
    let mut parts = data_url.split(',');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_prefix), Some(payload), None) if !payload.is_empty() => Ok(payload),
        _ => Err(InferenceError::MalformedPayload(
            "expected exactly one comma between data URL prefix and payload".to_string(),
        )),
    }
}

/// Decode a short leading segment to catch obviously broken payloads.
///
/// Line breaks and other ASCII whitespace are ignored. Segments of four or
/// more characters are cut to a multiple of four; shorter ones are decoded
/// as they are.
pub fn validate_base64_prefix(payload: &str) -> Result<(), InferenceError> {
    let mut segment: Vec<u8> = payload
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .take(VALIDATION_PREFIX_LEN)
        .collect();
    if segment.len() >= 4 {
        segment.truncate(segment.len() - segment.len() % 4);
    }

    if segment.is_empty() {
        return Err(InferenceError::MalformedPayload(
            "image payload is too short".to_string(),
        ));
    }

    LENIENT_BASE64
        .decode(&segment)
        .map(|_| ())
        .map_err(|e| InferenceError::MalformedPayload(format!("invalid base64: {}", e)))
}

fn parse_prediction(response: TransportResponse) -> Result<PredictionResult, RequestError> {
    let payload: PredictionPayload = serde_json::from_value(response.body).map_err(|e| {
        RequestError::new(
            ErrorKind::UnexpectedResponse,
            format!("prediction payload has the wrong shape: {}", e),
        )
    })?;

    let class_label: SeverityClass = payload
        .class
        .parse()
        .map_err(|e| RequestError::new(ErrorKind::UnexpectedResponse, format!("{}", e)))?;

    Ok(PredictionResult {
        class_label,
        confidence: payload.confidence.clamp(0.0, 1.0),
        is_simulation: payload.is_simulation.unwrap_or(false),
    })
}
