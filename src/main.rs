mod config;
mod feedback;
mod inference;
mod labels;
mod routes;
mod services;
mod state;
mod store;
mod views;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, InferenceMode};
use crate::feedback::FeedbackSink;
use crate::feedback::rest::RestFeedbackSink;
use crate::inference::Classifier;
use crate::inference::http::HttpClassifier;
use crate::inference::simulate::SimulatedClassifier;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env().expect("invalid configuration");

    let classifier: Arc<dyn Classifier> = match config.inference.mode {
        InferenceMode::Http => {
            let client = HttpClassifier::new(config.inference.url.clone(), config.inference.timeouts)
                .expect("inference client init failed");
            tracing::info!(url = client.url(), "inference client initialized");
            Arc::new(client)
        }
        InferenceMode::Simulate => {
            tracing::warn!("simulated inference enabled; predictions are random");
            Arc::new(SimulatedClassifier::new())
        }
    };

    // Feedback is optional: the results page hides the form when disabled.
    let feedback: Option<Arc<dyn FeedbackSink>> = match config.feedback_store.clone() {
        Some(store) => match RestFeedbackSink::new(store) {
            Ok(sink) => {
                tracing::info!(endpoint = sink.endpoint(), "feedback store initialized");
                Some(Arc::new(sink))
            }
            Err(e) => {
                tracing::warn!(error = %e, "feedback store unavailable; feedback disabled");
                None
            }
        },
        None => {
            tracing::warn!("FEEDBACK_URL not set; feedback disabled");
            None
        }
    };

    let state = state::AppState::new(classifier, feedback, config.feedback_image_prefix_len);

    let app = routes::app(state, config.max_upload_bytes);
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", config.bind_addr, config.port))
        .await
        .expect("failed to bind");

    tracing::info!(addr = %config.bind_addr, port = config.port, "sports predictor listening");
    axum::serve(listener, app).await.expect("server failed");
}
