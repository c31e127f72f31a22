//! Prediction store: in-memory history of classifier results.
//!
//! DESIGN
//! ======
//! One `PredictionStore` is constructed at startup and shared through
//! `AppState`. History is newest-first and only grows: the only write paths
//! are `append` and `from_external_prediction`. Entries are wrapped in `Arc`
//! once inserted and never touched again; readers get snapshots of the
//! `Arc`s, so the image payloads are shared rather than copied.
//!
//! The write lock serializes appends, so history order is call order even
//! when handlers run on several worker threads.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::inference::{ExternalPrediction, image_data_uri};

// =============================================================================
// RECORDS
// =============================================================================

/// One alternative label with its probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPrediction {
    pub sport: String,
    pub confidence: f64,
}

/// A stored prediction. Built only by [`PredictionStore::append`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub id: Uuid,
    pub sport: String,
    pub confidence: f64,
    pub top_predictions: Vec<TopPrediction>,
    /// Inline `data:` URI of the classified image.
    pub image_data: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Caller-supplied fields of a prediction. The store assigns `id` and
/// `timestamp`. Nothing here is validated (confidence is not clamped).
#[derive(Debug, Clone, PartialEq)]
pub struct NewPrediction {
    pub sport: String,
    pub confidence: f64,
    pub top_predictions: Vec<TopPrediction>,
    pub image_data: String,
}

// =============================================================================
// STORE
// =============================================================================

#[derive(Debug, Default)]
pub struct PredictionStore {
    entries: RwLock<Vec<Arc<PredictionResult>>>,
}

impl PredictionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new prediction at the front of the history and return it.
    pub fn append(&self, input: NewPrediction) -> Arc<PredictionResult> {
        let record = Arc::new(PredictionResult {
            id: Uuid::new_v4(),
            sport: input.sport,
            confidence: input.confidence,
            top_predictions: input.top_predictions,
            image_data: input.image_data,
            timestamp: OffsetDateTime::now_utc(),
        });

        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        entries.insert(0, Arc::clone(&record));
        drop(entries);

        tracing::debug!(id = %record.id, sport = %record.sport, "prediction recorded");
        record
    }

    /// Snapshot of the full history, newest first.
    #[must_use]
    pub fn get_all(&self) -> Vec<Arc<PredictionResult>> {
        self.read(Vec::clone)
    }

    /// Most recent prediction, or `None` when nothing has been recorded yet.
    #[must_use]
    pub fn get_latest(&self) -> Option<Arc<PredictionResult>> {
        self.read(|entries| entries.first().cloned())
    }

    #[must_use]
    pub fn find(&self, id: Uuid) -> Option<Arc<PredictionResult>> {
        self.read(|entries| entries.iter().find(|e| e.id == id).cloned())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read(Vec::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Map a validated inference response into store shape and append it.
    ///
    /// `top_preds` order and values carry over untouched; the raw base64
    /// image becomes a `data:` URI.
    #[allow(clippy::wrong_self_convention)]
    pub fn from_external_prediction(&self, response: ExternalPrediction) -> Arc<PredictionResult> {
        let top_predictions = response
            .top_preds
            .into_iter()
            .map(|p| TopPrediction { sport: p.label, confidence: p.prob })
            .collect();

        self.append(NewPrediction {
            sport: response.predicted,
            confidence: response.confidence,
            top_predictions,
            image_data: image_data_uri(&response.image),
        })
    }

    fn read<T>(&self, f: impl FnOnce(&Vec<Arc<PredictionResult>>) -> T) -> T {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f(&entries)
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
