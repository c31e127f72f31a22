//! HTTP client for the external predict endpoint.
//!
//! Sends the upload as a multipart form with a single `file` part. Any
//! non-success status is one uniform failure; its body is never read.

use reqwest::multipart::{Form, Part};

use super::{Classifier, ExternalPrediction, InferenceError, UploadedImage, parse_prediction};
use crate::config::Timeouts;

pub struct HttpClassifier {
    http: reqwest::Client,
    url: String,
}

impl HttpClassifier {
    /// # Errors
    ///
    /// Returns [`InferenceError::HttpClientBuild`] if the client cannot be built.
    pub fn new(url: String, timeouts: Timeouts) -> Result<Self, InferenceError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeouts.request() {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = timeouts.connect() {
            builder = builder.connect_timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| InferenceError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, url })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, image: UploadedImage) -> Result<ExternalPrediction, InferenceError> {
        let part = Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.content_type)
            .map_err(|e| InferenceError::Request(e.to_string()))?;
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| InferenceError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(InferenceError::Status(status.as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| InferenceError::Request(e.to_string()))?;

        Ok(parse_prediction(&text)?)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
