use std::sync::Arc;

use reqwest::header::LOCATION;
use reqwest::multipart::{Form as MultipartForm, Part};
use reqwest::redirect::Policy;
use serde_json::Value;

use super::*;
use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::inference::InferenceError;
use crate::routes::pages::{INVALID_FEEDBACK_MESSAGE, UPLOAD_TOO_LARGE_MESSAGE};
use crate::services::upload::PREDICTION_FAILED_MESSAGE;
use crate::state::test_helpers::{
    MockClassifier, MockFeedbackSink, golf_prediction, seed_prediction, test_app_state,
    test_app_state_with_feedback,
};

async fn spawn(state: AppState) -> String {
    spawn_with_limit(state, DEFAULT_MAX_UPLOAD_BYTES).await
}

async fn spawn_with_limit(state: AppState, max_upload_bytes: usize) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app(state, max_upload_bytes)).await.unwrap();
    });
    format!("http://{addr}")
}

fn location(response: &reqwest::Response) -> String {
    response.headers().get(LOCATION).unwrap().to_str().unwrap().to_owned()
}

fn popup(html: &str) -> &str {
    let start = html.find(r#"id="result-popup""#).unwrap();
    let end = start + html[start..].find("</dialog>").unwrap();
    &html[start..end]
}

fn client() -> reqwest::Client {
    reqwest::Client::builder().redirect(Policy::none()).build().unwrap()
}

fn jpeg_form() -> MultipartForm {
    let part = Part::bytes(vec![0xFF, 0xD8, 0xFF]).file_name("swing.jpg").mime_str("image/jpeg").unwrap();
    MultipartForm::new().part("file", part)
}

// =============================================================================
// pages
// =============================================================================

#[tokio::test]
async fn static_pages_render() {
    let base = spawn(test_app_state(Arc::new(MockClassifier::returning(golf_prediction())))).await;
    let client = client();

    for path in ["/", "/upload"] {
        let response = client.get(format!("{base}{path}")).send().await.unwrap();
        assert_eq!(response.status(), 200, "{path}");
        let body = response.text().await.unwrap();
        assert!(body.contains("<html"), "{path}");
    }

    let response = client.get(format!("{base}/healthz")).send().await.unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn upload_redirects_to_results_and_records_prediction() {
    let classifier = Arc::new(MockClassifier::returning(golf_prediction()));
    let state = test_app_state(classifier.clone());
    let base = spawn(state.clone()).await;

    let response = client().post(format!("{base}/upload")).multipart(jpeg_form()).send().await.unwrap();
    assert_eq!(response.status(), 303);
    let latest_id = state.store.get_latest().unwrap().id;
    assert_eq!(location(&response), format!("/results?notice=predicted&prediction={latest_id}"));

    let calls = classifier.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].file_name, "swing.jpg");
    assert_eq!(calls[0].bytes, vec![0xFF, 0xD8, 0xFF]);
    drop(calls);

    let latest = state.store.get_latest().unwrap();
    assert_eq!(latest.sport, "golf");
    assert_eq!(latest.image_data, "data:image/jpeg;base64,QUJD");

    let html = client().get(format!("{base}{}", location(&response))).send().await.unwrap().text().await.unwrap();
    assert!(popup(&html).contains("81%"));
}

#[tokio::test]
async fn upload_redirect_keeps_own_prediction_after_concurrent_upload() {
    let state = test_app_state_with_feedback(
        Arc::new(MockClassifier::returning(golf_prediction())),
        Arc::new(MockFeedbackSink::default()),
    );
    let base = spawn(state.clone()).await;

    let response = client().post(format!("{base}/upload")).multipart(jpeg_form()).send().await.unwrap();
    assert_eq!(response.status(), 303);
    let mine = state.store.get_latest().unwrap();

    // another client's upload lands before the redirect is followed
    seed_prediction(&state, "judo", 0.33);

    let html = client().get(format!("{base}{}", location(&response))).send().await.unwrap().text().await.unwrap();
    let popup = popup(&html);
    assert!(popup.contains("golf"));
    assert!(!popup.contains("judo"));
    assert!(html.contains(&format!(r#"name="prediction_id" value="{}""#, mine.id)));
}

#[tokio::test]
async fn upload_over_body_limit_is_payload_too_large() {
    let classifier = Arc::new(MockClassifier::returning(golf_prediction()));
    let state = test_app_state(classifier.clone());
    let base = spawn_with_limit(state.clone(), 1024).await;

    let part = Part::bytes(vec![0xAB; 4096]).file_name("huge.jpg").mime_str("image/jpeg").unwrap();
    let form = MultipartForm::new().part("file", part);
    let response = client().post(format!("{base}/upload")).multipart(form).send().await.unwrap();

    assert_eq!(response.status(), 413);
    let body = response.text().await.unwrap();
    assert!(body.contains(UPLOAD_TOO_LARGE_MESSAGE));
    assert!(classifier.calls.lock().unwrap().is_empty());
    assert!(state.store.is_empty());
}

#[tokio::test]
async fn upload_rejects_non_image() {
    let classifier = Arc::new(MockClassifier::returning(golf_prediction()));
    let state = test_app_state(classifier.clone());
    let base = spawn(state.clone()).await;

    let part = Part::bytes(b"hello".to_vec()).file_name("notes.txt").mime_str("text/plain").unwrap();
    let form = MultipartForm::new().part("file", part);
    let response = client().post(format!("{base}/upload")).multipart(form).send().await.unwrap();

    assert_eq!(response.status(), 400);
    assert!(classifier.calls.lock().unwrap().is_empty());
    assert!(state.store.is_empty());
}

#[tokio::test]
async fn upload_without_file_is_bad_request() {
    let state = test_app_state(Arc::new(MockClassifier::returning(golf_prediction())));
    let base = spawn(state.clone()).await;

    let form = MultipartForm::new().text("other", "value");
    let response = client().post(format!("{base}/upload")).multipart(form).send().await.unwrap();

    assert_eq!(response.status(), 400);
    assert!(state.store.is_empty());
}

#[tokio::test]
async fn upload_classifier_failure_shows_message() {
    let state = test_app_state(Arc::new(MockClassifier::failing(InferenceError::Status(500))));
    let base = spawn(state.clone()).await;

    let response = client().post(format!("{base}/upload")).multipart(jpeg_form()).send().await.unwrap();
    assert_eq!(response.status(), 502);
    let body = response.text().await.unwrap();
    assert!(body.contains(PREDICTION_FAILED_MESSAGE));
    assert!(state.store.is_empty());
}

#[tokio::test]
async fn results_page_empty_and_filled() {
    let state = test_app_state(Arc::new(MockClassifier::returning(golf_prediction())));
    let base = spawn(state.clone()).await;

    let html = client().get(format!("{base}/results")).send().await.unwrap().text().await.unwrap();
    assert!(html.contains("No Predictions Yet"));

    seed_prediction(&state, "judo", 0.88);
    let html = client().get(format!("{base}/results")).send().await.unwrap().text().await.unwrap();
    assert!(html.contains("Latest Prediction"));
    assert!(html.contains("Prediction History"));
}

// =============================================================================
// feedback
// =============================================================================

#[tokio::test]
async fn feedback_form_post_redirects() {
    let sink = Arc::new(MockFeedbackSink::default());
    let state = test_app_state_with_feedback(Arc::new(MockClassifier::returning(golf_prediction())), sink.clone());
    let prediction = seed_prediction(&state, "judo", 0.88);
    let base = spawn(state).await;

    let id = prediction.id.to_string();
    let response = client()
        .post(format!("{base}/results/feedback"))
        .form(&[
            ("prediction_id", id.as_str()),
            ("feedback_type", "incorrect"),
            ("correct_sport", "sumo wrestling"),
            ("comment", "two people in a ring"),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), format!("/results?notice=feedback-sent&prediction={id}"));

    let rows = sink.rows.lock().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].prediction_sport, "judo");
    assert_eq!(rows[0].correct_sport.as_deref(), Some("sumo wrestling"));
    assert_eq!(rows[0].user_comment.as_deref(), Some("two people in a ring"));
}

#[tokio::test]
async fn feedback_undecodable_form_renders_notice() {
    let sink = Arc::new(MockFeedbackSink::default());
    let state = test_app_state_with_feedback(Arc::new(MockClassifier::returning(golf_prediction())), sink.clone());
    let prediction = seed_prediction(&state, "judo", 0.88);
    let base = spawn(state).await;

    let id = prediction.id.to_string();
    let bad_forms = [
        vec![("prediction_id", id.as_str()), ("feedback_type", "maybe")],
        vec![("prediction_id", "not-a-uuid"), ("feedback_type", "correct")],
        vec![("prediction_id", id.as_str())],
    ];
    for form in bad_forms {
        let response = client().post(format!("{base}/results/feedback")).form(&form).send().await.unwrap();
        assert_eq!(response.status(), 400, "{form:?}");
        let html = response.text().await.unwrap();
        assert!(html.contains("notice error"), "{form:?}");
        assert!(html.contains(INVALID_FEEDBACK_MESSAGE), "{form:?}");
    }
    assert!(sink.rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn feedback_disabled_is_unavailable() {
    let state = test_app_state(Arc::new(MockClassifier::returning(golf_prediction())));
    let prediction = seed_prediction(&state, "judo", 0.88);
    let base = spawn(state).await;

    let id = prediction.id.to_string();
    let response = client()
        .post(format!("{base}/results/feedback"))
        .form(&[("prediction_id", id.as_str()), ("feedback_type", "correct")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 503);
}

// =============================================================================
// JSON API
// =============================================================================

#[tokio::test]
async fn api_lists_predictions_newest_first() {
    let state = test_app_state(Arc::new(MockClassifier::returning(golf_prediction())));
    let base = spawn(state.clone()).await;
    let client = client();

    let latest: Value = client.get(format!("{base}/api/predictions/latest")).send().await.unwrap().json().await.unwrap();
    assert!(latest.is_null());

    seed_prediction(&state, "judo", 0.88);
    let newest = seed_prediction(&state, "rowing", 0.7);

    let all: Value = client.get(format!("{base}/api/predictions")).send().await.unwrap().json().await.unwrap();
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0]["sport"], "rowing");
    assert_eq!(all[1]["sport"], "judo");
    assert!(all[0]["topPredictions"].is_array());
    assert!(all[0]["imageData"].is_string());

    let latest: Value = client.get(format!("{base}/api/predictions/latest")).send().await.unwrap().json().await.unwrap();
    assert_eq!(latest["id"], newest.id.to_string());

    let one: Value = client
        .get(format!("{base}/api/predictions/{}", newest.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(one["sport"], "rowing");
}

#[tokio::test]
async fn api_unknown_prediction_is_not_found() {
    let base = spawn(test_app_state(Arc::new(MockClassifier::returning(golf_prediction())))).await;
    let response = client()
        .get(format!("{base}/api/predictions/{}", uuid::Uuid::new_v4()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn api_labels_lists_all_sports() {
    let base = spawn(test_app_state(Arc::new(MockClassifier::returning(golf_prediction())))).await;
    let labels: Vec<String> = client().get(format!("{base}/api/labels")).send().await.unwrap().json().await.unwrap();
    assert_eq!(labels.len(), 100);
    assert!(labels.iter().any(|l| l == "sumo wrestling"));
}
