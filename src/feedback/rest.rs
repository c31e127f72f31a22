//! Hosted data store client (PostgREST-style insert endpoint).
//!
//! `POST {base_url}/rest/v1/{table}` with the project key in both the
//! `apikey` and bearer headers. Only success or failure is consumed; the
//! response body is never read.

use reqwest::header::AUTHORIZATION;

use super::{FeedbackError, FeedbackRecord, FeedbackSink};
use crate::config::FeedbackStoreConfig;

pub struct RestFeedbackSink {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl RestFeedbackSink {
    /// # Errors
    ///
    /// Returns [`FeedbackError::HttpClientBuild`] if the client cannot be built.
    pub fn new(config: FeedbackStoreConfig) -> Result<Self, FeedbackError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeouts.request() {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.timeouts.connect() {
            builder = builder.connect_timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| FeedbackError::HttpClientBuild(e.to_string()))?;

        let endpoint = format!("{}/rest/v1/{}", config.base_url, config.table);
        Ok(Self { http, endpoint, api_key: config.api_key })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl FeedbackSink for RestFeedbackSink {
    async fn insert(&self, record: &FeedbackRecord) -> Result<(), FeedbackError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header("apikey", &self.api_key)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await
            .map_err(|e| FeedbackError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedbackError::Status(status.as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "rest_test.rs"]
mod tests;
