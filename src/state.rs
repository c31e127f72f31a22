//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It owns the single `PredictionStore` for the process plus the two
//! external collaborators: the classifier and the optional feedback sink.

use std::sync::Arc;

use crate::feedback::FeedbackSink;
use crate::inference::Classifier;
use crate::store::PredictionStore;

/// Clone is required by Axum; every field is Arc-wrapped or Copy.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<PredictionStore>,
    pub classifier: Arc<dyn Classifier>,
    /// `None` when the feedback store is not configured.
    pub feedback: Option<Arc<dyn FeedbackSink>>,
    pub feedback_image_prefix_len: usize,
}

impl AppState {
    #[must_use]
    pub fn new(
        classifier: Arc<dyn Classifier>,
        feedback: Option<Arc<dyn FeedbackSink>>,
        feedback_image_prefix_len: usize,
    ) -> Self {
        Self { store: Arc::new(PredictionStore::new()), classifier, feedback, feedback_image_prefix_len }
    }

    #[must_use]
    pub fn feedback_enabled(&self) -> bool {
        self.feedback.is_some()
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
