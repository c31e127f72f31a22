//! HTML page routes and the two form POSTs.
//!
//! Flow failures never escape as 500s: each one re-renders its page with an
//! error notice and a status code describing what went wrong.

use std::sync::Arc;

use axum::extract::multipart::MultipartError;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::feedback::{FeedbackError, FeedbackSubmission};
use crate::inference::UploadedImage;
use crate::services::feedback::{self as feedback_flow, submit_feedback};
use crate::services::upload::{UploadError, predict_upload};
use crate::state::AppState;
use crate::store::PredictionResult;
use crate::views::{self, NOTICE_FEEDBACK_SENT, NOTICE_PREDICTED, Notice, ResultsView};

const FILE_FIELD: &str = "file";

pub const UPLOAD_TOO_LARGE_MESSAGE: &str = "That image is too large to upload.";
pub const INVALID_FEEDBACK_MESSAGE: &str = "Choose whether the prediction was correct and try again.";

/// `GET /`: landing view.
pub async fn landing() -> Html<String> {
    Html(views::render_landing())
}

/// `GET /upload`: upload view.
pub async fn upload_form() -> Html<String> {
    Html(views::render_upload(None))
}

/// `POST /upload`: classify the `file` part, record it, go to results.
pub async fn upload_submit(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            warn!(error = %rejection, "upload rejected");
            return upload_error(rejection.status(), rejection.body_text());
        }
    };
    let image = match read_image(multipart).await {
        Ok(image) => image,
        Err((status, message)) => {
            warn!(%status, %message, "upload rejected");
            return upload_error(status, message);
        }
    };

    match predict_upload(&state, image).await {
        Ok(record) => Redirect::to(&results_location(NOTICE_PREDICTED, record.id)).into_response(),
        Err(e) => upload_error(upload_error_to_status(&e), e.user_message().to_owned()),
    }
}

async fn read_image(mut multipart: Multipart) -> Result<Option<UploadedImage>, (StatusCode, String)> {
    loop {
        let field = multipart.next_field().await.map_err(|e| multipart_error(&e))?;
        let Some(field) = field else {
            return Ok(None);
        };
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_owned();
        let content_type = field.content_type().unwrap_or_default().to_owned();
        let bytes = field.bytes().await.map_err(|e| multipart_error(&e))?;
        return Ok(Some(UploadedImage { file_name, content_type, bytes: bytes.to_vec() }));
    }
}

/// Body over the upload limit surfaces here as 413, mid-stream.
fn multipart_error(err: &MultipartError) -> (StatusCode, String) {
    let status = err.status();
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        (status, UPLOAD_TOO_LARGE_MESSAGE.to_owned())
    } else {
        (status, err.body_text())
    }
}

/// Redirect target after a successful POST. Carries the prediction id so the
/// page features that prediction even if others were made in between.
fn results_location(notice: &str, prediction: Uuid) -> String {
    format!("/results?notice={notice}&prediction={prediction}")
}

fn upload_error(status: StatusCode, message: String) -> Response {
    let notice = Notice::error(message);
    (status, Html(views::render_upload(Some(&notice)))).into_response()
}

pub(crate) fn upload_error_to_status(err: &UploadError) -> StatusCode {
    match err {
        UploadError::NoFile | UploadError::NotAnImage(_) => StatusCode::BAD_REQUEST,
        UploadError::Inference(_) => StatusCode::BAD_GATEWAY,
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ResultsQuery {
    pub selected: Option<String>,
    pub notice: Option<String>,
    /// Prediction the caller just made or voted on.
    pub prediction: Option<String>,
}

/// `GET /results`: latest prediction, chart, feedback form and history.
pub async fn results(State(state): State<AppState>, Query(query): Query<ResultsQuery>) -> Html<String> {
    let notice_code = query.notice.as_deref().unwrap_or_default();
    let lookup = |raw: Option<&str>| {
        raw.and_then(|raw| Uuid::parse_str(raw).ok())
            .and_then(|id| state.store.find(id))
    };
    let featured = lookup(query.prediction.as_deref());
    let selected = lookup(query.selected.as_deref());

    let view = ResultsView {
        selected,
        notice: Notice::from_code(notice_code),
        show_popup: notice_code == NOTICE_PREDICTED,
        feedback_submitted: notice_code == NOTICE_FEEDBACK_SENT,
        ..results_view(&state, featured)
    };
    Html(views::render_results(&view))
}

/// Unknown or missing `featured` falls back to the newest prediction.
fn results_view(state: &AppState, featured: Option<Arc<PredictionResult>>) -> ResultsView {
    ResultsView {
        latest: featured.or_else(|| state.store.get_latest()),
        history: state.store.get_all(),
        feedback_enabled: state.feedback_enabled(),
        ..ResultsView::default()
    }
}

fn results_error(
    state: &AppState,
    status: StatusCode,
    message: String,
    featured: Option<Arc<PredictionResult>>,
) -> Response {
    let view = ResultsView { notice: Some(Notice::error(message)), ..results_view(state, featured) };
    (status, Html(views::render_results(&view))).into_response()
}

/// `POST /results/feedback`: send a correctness vote to the data store.
pub async fn feedback_submit(
    State(state): State<AppState>,
    form: Result<Form<FeedbackSubmission>, FormRejection>,
) -> Response {
    let submission = match form {
        Ok(Form(submission)) => submission,
        Err(rejection) => {
            warn!(error = %rejection, "feedback form rejected");
            return results_error(&state, StatusCode::BAD_REQUEST, INVALID_FEEDBACK_MESSAGE.to_owned(), None);
        }
    };

    let prediction_id = submission.prediction_id;
    match submit_feedback(&state, submission).await {
        Ok(_) => Redirect::to(&results_location(NOTICE_FEEDBACK_SENT, prediction_id)).into_response(),
        Err(e) => results_error(
            &state,
            feedback_error_to_status(&e),
            feedback_flow::user_message(&e),
            state.store.find(prediction_id),
        ),
    }
}

pub(crate) fn feedback_error_to_status(err: &FeedbackError) -> StatusCode {
    match err {
        FeedbackError::Disabled => StatusCode::SERVICE_UNAVAILABLE,
        FeedbackError::MissingCorrectSport | FeedbackError::UnknownSport(_) => StatusCode::BAD_REQUEST,
        FeedbackError::PredictionNotFound(_) => StatusCode::NOT_FOUND,
        FeedbackError::Request(_) | FeedbackError::Status(_) | FeedbackError::HttpClientBuild(_) => {
            StatusCode::BAD_GATEWAY
        }
    }
}

#[cfg(test)]
#[path = "pages_test.rs"]
mod tests;
