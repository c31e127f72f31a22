//! Upload flow: uploaded image -> classifier -> prediction store.

use std::sync::Arc;

use tracing::{info, warn};

use crate::inference::{InferenceError, UploadedImage};
use crate::state::AppState;
use crate::store::PredictionResult;

pub const PREDICTION_FAILED_MESSAGE: &str = "Failed to get prediction. Ensure backend is running.";

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("no file uploaded")]
    NoFile,
    #[error("uploaded file is not an image (content type {0:?})")]
    NotAnImage(String),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl UploadError {
    /// Text shown to the user. Transport and mapping failures share one
    /// message.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NoFile => "Choose an image to upload first.",
            Self::NotAnImage(_) => "Only image files can be classified.",
            Self::Inference(_) => PREDICTION_FAILED_MESSAGE,
        }
    }
}

/// Classify one upload and record the result.
///
/// # Errors
///
/// [`UploadError::NoFile`] / [`UploadError::NotAnImage`] for bad input;
/// [`UploadError::Inference`] when the classifier call or response mapping
/// fails. The store is untouched on any error.
pub async fn predict_upload(state: &AppState, image: Option<UploadedImage>) -> Result<Arc<PredictionResult>, UploadError> {
    let image = image
        .filter(|img| !img.bytes.is_empty())
        .ok_or(UploadError::NoFile)?;
    if !image.is_image() {
        return Err(UploadError::NotAnImage(image.content_type));
    }

    let file_name = image.file_name.clone();
    let size = image.bytes.len();
    let prediction = state
        .classifier
        .classify(image)
        .await
        .inspect_err(|e| {
            warn!(error = %e, classifier = state.classifier.name(), %file_name, "prediction failed");
        })?;

    let record = state.store.from_external_prediction(prediction);
    info!(
        id = %record.id,
        sport = %record.sport,
        confidence = record.confidence,
        %file_name,
        size,
        history = state.store.len(),
        "prediction complete"
    );
    Ok(record)
}

#[cfg(test)]
#[path = "upload_test.rs"]
mod tests;
