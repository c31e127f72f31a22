//! Feedback: correctness signals sent to the hosted data store.
//!
//! DESIGN
//! ======
//! A `FeedbackSubmission` is what the results form posts. It is validated
//! against the label catalog, then combined with the stored prediction into
//! a `FeedbackRecord`, the row shape of the external `prediction_feedback`
//! table. The image encoding in that row is cut to a fixed prefix, so the
//! stored image cannot be reconstructed from feedback alone.

pub mod rest;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::labels::is_known_label;
use crate::store::PredictionResult;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum FeedbackError {
    #[error("feedback store is not configured")]
    Disabled,

    #[error("select the correct sport when marking a prediction incorrect")]
    MissingCorrectSport,

    #[error("unknown sport label: {0}")]
    UnknownSport(String),

    #[error("prediction {0} not found")]
    PredictionNotFound(Uuid),

    #[error("feedback request failed: {0}")]
    Request(String),

    /// Any non-success status. The body is not read.
    #[error("feedback store returned status {0}")]
    Status(u16),

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackType {
    Correct,
    Incorrect,
}

impl FeedbackType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::Incorrect => "incorrect",
        }
    }
}

/// Form body posted from the results view.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackSubmission {
    pub prediction_id: Uuid,
    pub feedback_type: FeedbackType,
    #[serde(default)]
    pub correct_sport: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// A submission that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidFeedback {
    pub prediction_id: Uuid,
    pub feedback_type: FeedbackType,
    /// Set only for `Incorrect`.
    pub correct_sport: Option<String>,
    pub comment: Option<String>,
}

impl FeedbackSubmission {
    /// Normalize and check the form fields.
    ///
    /// # Errors
    ///
    /// An `incorrect` vote needs a correct sport from the label catalog.
    pub fn validate(self) -> Result<ValidFeedback, FeedbackError> {
        let correct_sport = match self.feedback_type {
            FeedbackType::Correct => None,
            FeedbackType::Incorrect => {
                let sport = non_blank(self.correct_sport).ok_or(FeedbackError::MissingCorrectSport)?;
                if !is_known_label(&sport) {
                    return Err(FeedbackError::UnknownSport(sport));
                }
                Some(sport)
            }
        };

        Ok(ValidFeedback {
            prediction_id: self.prediction_id,
            feedback_type: self.feedback_type,
            correct_sport,
            comment: non_blank(self.comment),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// One row of the external feedback table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackRecord {
    pub prediction_sport: String,
    pub correct_sport: Option<String>,
    pub confidence: f64,
    pub image_data: String,
    pub feedback_type: FeedbackType,
    pub user_comment: Option<String>,
}

impl FeedbackRecord {
    #[must_use]
    pub fn new(prediction: &PredictionResult, feedback: ValidFeedback, image_prefix_len: usize) -> Self {
        Self {
            prediction_sport: prediction.sport.clone(),
            correct_sport: feedback.correct_sport,
            confidence: prediction.confidence,
            image_data: truncate_chars(&prediction.image_data, image_prefix_len).to_owned(),
            feedback_type: feedback.feedback_type,
            user_comment: feedback.comment,
        }
    }
}

/// First `max` characters of `s`, never splitting a UTF-8 sequence.
#[must_use]
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// =============================================================================
// SINK TRAIT
// =============================================================================

/// Destination for feedback rows. Enables mocking in tests.
#[async_trait::async_trait]
pub trait FeedbackSink: Send + Sync {
    /// # Errors
    ///
    /// Returns a [`FeedbackError`] if the insert does not succeed.
    async fn insert(&self, record: &FeedbackRecord) -> Result<(), FeedbackError>;
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
