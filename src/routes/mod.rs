//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Three HTML views (`/`, `/upload`, `/results`) plus the two form POSTs
//! that drive the upload and feedback flows. A read-only JSON API exposes
//! the same prediction history for scripts and other front ends.

pub mod api;
pub mod pages;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router.
pub fn app(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/api/predictions", get(api::list_predictions))
        .route("/api/predictions/latest", get(api::latest_prediction))
        .route("/api/predictions/{id}", get(api::get_prediction))
        .route("/api/labels", get(api::list_labels))
        .layer(cors);

    Router::new()
        .route("/", get(pages::landing))
        .route("/upload", get(pages::upload_form).post(pages::upload_submit))
        .route("/results", get(pages::results))
        .route("/results/feedback", post(pages::feedback_submit))
        .route("/healthz", get(healthz))
        .merge(api_routes)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
