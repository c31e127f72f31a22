//! Read-only JSON API over the prediction store.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use uuid::Uuid;

use crate::labels::SPORTS_LABELS;
use crate::state::AppState;
use crate::store::PredictionResult;

/// `GET /api/predictions`: full history, newest first.
pub async fn list_predictions(State(state): State<AppState>) -> Json<Vec<Arc<PredictionResult>>> {
    Json(state.store.get_all())
}

/// `GET /api/predictions/latest`: most recent prediction or `null`.
pub async fn latest_prediction(State(state): State<AppState>) -> Json<Option<Arc<PredictionResult>>> {
    Json(state.store.get_latest())
}

/// `GET /api/predictions/{id}`: one history entry.
pub async fn get_prediction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Arc<PredictionResult>>, StatusCode> {
    state
        .store
        .find(id)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// `GET /api/labels`: sport classes accepted as a feedback correction.
pub async fn list_labels() -> Json<&'static [&'static str]> {
    Json(&SPORTS_LABELS[..])
}
