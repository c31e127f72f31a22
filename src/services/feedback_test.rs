use std::sync::Arc;

use uuid::Uuid;

use super::*;
use crate::feedback::FeedbackType;
use crate::state::test_helpers::{
    MockClassifier, MockFeedbackSink, golf_prediction, seed_prediction, test_app_state,
    test_app_state_with_feedback,
};

fn classifier() -> Arc<MockClassifier> {
    Arc::new(MockClassifier::returning(golf_prediction()))
}

fn vote(prediction_id: Uuid, kind: FeedbackType, correct: Option<&str>) -> FeedbackSubmission {
    FeedbackSubmission {
        prediction_id,
        feedback_type: kind,
        correct_sport: correct.map(str::to_owned),
        comment: Some("great app".into()),
    }
}

#[tokio::test]
async fn submit_feedback_inserts_row_for_prediction() {
    let sink = Arc::new(MockFeedbackSink::default());
    let state = test_app_state_with_feedback(classifier(), sink.clone());
    let prediction = seed_prediction(&state, "rugby", 0.77);

    let record = submit_feedback(&state, vote(prediction.id, FeedbackType::Incorrect, Some("lacrosse")))
        .await
        .unwrap();
    assert_eq!(record.prediction_sport, "rugby");
    assert_eq!(record.correct_sport.as_deref(), Some("lacrosse"));
    assert_eq!(record.user_comment.as_deref(), Some("great app"));

    let rows = sink.rows.lock().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0], record);
}

#[tokio::test]
async fn submit_feedback_truncates_image_to_configured_prefix() {
    let sink = Arc::new(MockFeedbackSink::default());
    let mut state = test_app_state_with_feedback(classifier(), sink.clone());
    state.feedback_image_prefix_len = 10;
    let prediction = seed_prediction(&state, "rugby", 0.77);

    let record = submit_feedback(&state, vote(prediction.id, FeedbackType::Correct, None))
        .await
        .unwrap();
    assert_eq!(record.image_data, "data:image");
}

#[tokio::test]
async fn submit_feedback_disabled_without_sink() {
    let state = test_app_state(classifier());
    let prediction = seed_prediction(&state, "rugby", 0.77);

    let err = submit_feedback(&state, vote(prediction.id, FeedbackType::Correct, None))
        .await
        .unwrap_err();
    assert!(matches!(err, FeedbackError::Disabled));
}

#[tokio::test]
async fn submit_feedback_unknown_prediction() {
    let sink = Arc::new(MockFeedbackSink::default());
    let state = test_app_state_with_feedback(classifier(), sink.clone());

    let missing = Uuid::new_v4();
    let err = submit_feedback(&state, vote(missing, FeedbackType::Correct, None))
        .await
        .unwrap_err();
    assert!(matches!(err, FeedbackError::PredictionNotFound(id) if id == missing));
    assert!(sink.rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn submit_feedback_validation_runs_before_insert() {
    let sink = Arc::new(MockFeedbackSink::default());
    let state = test_app_state_with_feedback(classifier(), sink.clone());
    let prediction = seed_prediction(&state, "rugby", 0.77);

    let err = submit_feedback(&state, vote(prediction.id, FeedbackType::Incorrect, None))
        .await
        .unwrap_err();
    assert!(matches!(err, FeedbackError::MissingCorrectSport));
    assert!(sink.rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn submit_feedback_surfaces_store_failure() {
    let sink = Arc::new(MockFeedbackSink { fail_with_status: Some(500), ..MockFeedbackSink::default() });
    let state = test_app_state_with_feedback(classifier(), sink);
    let prediction = seed_prediction(&state, "rugby", 0.77);

    let err = submit_feedback(&state, vote(prediction.id, FeedbackType::Correct, None))
        .await
        .unwrap_err();
    assert!(matches!(err, FeedbackError::Status(500)));
    assert_eq!(user_message(&err), FEEDBACK_FAILED_MESSAGE);
}

#[test]
fn user_message_passes_through_validation_text() {
    let msg = user_message(&FeedbackError::MissingCorrectSport);
    assert!(msg.contains("correct sport"));
    assert_eq!(user_message(&FeedbackError::Request("refused".into())), FEEDBACK_FAILED_MESSAGE);
}
