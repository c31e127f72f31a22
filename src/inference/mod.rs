//! Inference: boundary to the external image classifier.
//!
//! DESIGN
//! ======
//! The CNN runs in a separate service. This module owns the wire schema of
//! its predict response and validates it before anything reaches the store:
//! every field arrives as `Option` and a missing one fails with
//! [`AdaptError::MissingField`]. `Classifier` is the seam handlers depend
//! on; [`http::HttpClassifier`] talks to the real service and
//! [`simulate::SimulatedClassifier`] stands in when no model is running.

pub mod http;
pub mod simulate;

use serde::Deserialize;

/// Prefix turning the service's base64 JPEG into an inline image URI.
pub const IMAGE_URI_PREFIX: &str = "data:image/jpeg;base64,";

// =============================================================================
// ERRORS
// =============================================================================

/// The predict response could not be mapped into a prediction.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AdaptError {
    #[error("response body is not valid JSON: {0}")]
    Malformed(String),
    #[error("response is missing field `{0}`")]
    MissingField(&'static str),
}

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    /// The request never completed (connect refused, timeout, broken body).
    #[error("inference request failed: {0}")]
    Request(String),

    /// Any non-success status. The body is not inspected.
    #[error("inference service returned status {0}")]
    Status(u16),

    #[error(transparent)]
    Adapt(#[from] AdaptError),

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

// =============================================================================
// TYPES
// =============================================================================

/// An uploaded image as received from the browser.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    /// Mirrors the `accept="image/*"` filter on the upload input.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.content_type
            .trim()
            .to_ascii_lowercase()
            .starts_with("image/")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExternalTopPrediction {
    pub label: String,
    pub prob: f64,
}

/// A validated predict response.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalPrediction {
    pub predicted: String,
    pub confidence: f64,
    pub top_preds: Vec<ExternalTopPrediction>,
    /// Base64 JPEG, without a URI prefix.
    pub image: String,
}

/// Classifies one uploaded image. Enables mocking in tests.
#[async_trait::async_trait]
pub trait Classifier: Send + Sync {
    /// # Errors
    ///
    /// Returns an [`InferenceError`] when the service is unreachable, answers
    /// with a non-success status, or sends a response that fails validation.
    async fn classify(&self, image: UploadedImage) -> Result<ExternalPrediction, InferenceError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

// =============================================================================
// WIRE SCHEMA
// =============================================================================

#[derive(Debug, Default, Deserialize)]
struct RawPrediction {
    predicted: Option<String>,
    confidence: Option<f64>,
    top_preds: Option<Vec<RawTopPrediction>>,
    image: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTopPrediction {
    label: Option<String>,
    prob: Option<f64>,
}

/// Parse and validate a predict response body.
///
/// # Errors
///
/// [`AdaptError::Malformed`] when the body is not a JSON object of the
/// expected shape, [`AdaptError::MissingField`] when a required field is
/// absent or null.
pub fn parse_prediction(body: &str) -> Result<ExternalPrediction, AdaptError> {
    let raw: RawPrediction = serde_json::from_str(body).map_err(|e| AdaptError::Malformed(e.to_string()))?;

    let top_preds = raw
        .top_preds
        .ok_or(AdaptError::MissingField("top_preds"))?
        .into_iter()
        .map(|p| {
            Ok(ExternalTopPrediction {
                label: p.label.ok_or(AdaptError::MissingField("top_preds[].label"))?,
                prob: p.prob.ok_or(AdaptError::MissingField("top_preds[].prob"))?,
            })
        })
        .collect::<Result<Vec<_>, AdaptError>>()?;

    Ok(ExternalPrediction {
        predicted: raw.predicted.ok_or(AdaptError::MissingField("predicted"))?,
        confidence: raw.confidence.ok_or(AdaptError::MissingField("confidence"))?,
        top_preds,
        image: raw.image.ok_or(AdaptError::MissingField("image"))?,
    })
}

#[must_use]
pub fn image_data_uri(base64: &str) -> String {
    format!("{IMAGE_URI_PREFIX}{base64}")
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
