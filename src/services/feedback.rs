//! Feedback flow: form submission -> validated row -> hosted data store.

use tracing::{info, warn};

use crate::feedback::{FeedbackError, FeedbackRecord, FeedbackSubmission};
use crate::state::AppState;

pub const FEEDBACK_FAILED_MESSAGE: &str = "Failed to submit feedback. Please try again.";

/// Text shown to the user for a feedback failure.
#[must_use]
pub fn user_message(err: &FeedbackError) -> String {
    match err {
        FeedbackError::Disabled => "Feedback is not available right now.".into(),
        FeedbackError::MissingCorrectSport | FeedbackError::UnknownSport(_) => err.to_string(),
        FeedbackError::PredictionNotFound(_) => "That prediction is no longer available.".into(),
        FeedbackError::Request(_) | FeedbackError::Status(_) | FeedbackError::HttpClientBuild(_) => {
            FEEDBACK_FAILED_MESSAGE.into()
        }
    }
}

/// Validate a submission against the stored prediction and insert it.
///
/// # Errors
///
/// [`FeedbackError::Disabled`] without a configured sink, validation errors
/// for bad form input, [`FeedbackError::PredictionNotFound`] for an unknown
/// id, and the sink's error when the insert fails.
pub async fn submit_feedback(state: &AppState, submission: FeedbackSubmission) -> Result<FeedbackRecord, FeedbackError> {
    let Some(sink) = state.feedback.as_ref() else {
        return Err(FeedbackError::Disabled);
    };

    let feedback = submission.validate()?;
    let prediction = state
        .store
        .find(feedback.prediction_id)
        .ok_or(FeedbackError::PredictionNotFound(feedback.prediction_id))?;

    let prediction_id = prediction.id;
    let record = FeedbackRecord::new(&prediction, feedback, state.feedback_image_prefix_len);
    sink.insert(&record).await.inspect_err(|e| {
        warn!(error = %e, %prediction_id, "feedback submission failed");
    })?;

    info!(
        %prediction_id,
        feedback_type = record.feedback_type.as_str(),
        correct_sport = record.correct_sport.as_deref().unwrap_or("-"),
        "feedback submitted"
    );
    Ok(record)
}

#[cfg(test)]
#[path = "feedback_test.rs"]
mod tests;
