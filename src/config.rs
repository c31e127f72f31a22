//! Service configuration parsed from environment variables.
//!
//! Every variable is optional. Network timeouts stay off unless set: the
//! inference and feedback calls have no deadline by default.

use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_INFERENCE_URL: &str = "http://localhost:5000/api/predict";
pub const DEFAULT_FEEDBACK_TABLE: &str = "prediction_feedback";
pub const DEFAULT_FEEDBACK_IMAGE_PREFIX_LEN: usize = 1000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
    #[error("{var} is required when {because} is set")]
    MissingVar { var: &'static str, because: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferenceMode {
    /// Forward uploads to the external predict endpoint.
    Http,
    /// Produce random predictions locally.
    Simulate,
}

/// Optional deadlines for an outbound HTTP client. `None` means no limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: Option<u64>,
    pub connect_secs: Option<u64>,
}

impl Timeouts {
    #[must_use]
    pub fn request(&self) -> Option<Duration> {
        self.request_secs.map(Duration::from_secs)
    }

    #[must_use]
    pub fn connect(&self) -> Option<Duration> {
        self.connect_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceConfig {
    pub mode: InferenceMode,
    pub url: String,
    pub timeouts: Timeouts,
}

/// Hosted data store credentials. Absent when feedback is not configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackStoreConfig {
    pub base_url: String,
    pub api_key: String,
    pub table: String,
    pub timeouts: Timeouts,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub inference: InferenceConfig,
    pub feedback_store: Option<FeedbackStoreConfig>,
    /// Characters of the image encoding kept in a feedback record.
    pub feedback_image_prefix_len: usize,
}

impl AppConfig {
    /// Build typed config from the process environment.
    ///
    /// - `PORT` (3000), `BIND_ADDR` (0.0.0.0), `MAX_UPLOAD_BYTES` (10 MiB)
    /// - `INFERENCE_MODE`: `http` (default) or `simulate`
    /// - `INFERENCE_URL`: predict endpoint
    /// - `INFERENCE_TIMEOUT_SECS`, `INFERENCE_CONNECT_TIMEOUT_SECS`: unset by default
    /// - `FEEDBACK_URL` + `FEEDBACK_API_KEY`: enable feedback submission
    /// - `FEEDBACK_TABLE` (`prediction_feedback`), `FEEDBACK_TIMEOUT_SECS`
    /// - `FEEDBACK_IMAGE_PREFIX_LEN` (1000)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a value does not parse or `FEEDBACK_URL`
    /// is set without `FEEDBACK_API_KEY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build typed config from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Same as [`AppConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let port = parse_or("PORT", var("PORT"), DEFAULT_PORT)?;
        let bind_addr = var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned());
        let max_upload_bytes = parse_or("MAX_UPLOAD_BYTES", var("MAX_UPLOAD_BYTES"), DEFAULT_MAX_UPLOAD_BYTES)?;

        let mode = parse_mode(var("INFERENCE_MODE"))?;
        let inference = InferenceConfig {
            mode,
            url: var("INFERENCE_URL").unwrap_or_else(|| DEFAULT_INFERENCE_URL.to_owned()),
            timeouts: Timeouts {
                request_secs: parse_opt("INFERENCE_TIMEOUT_SECS", var("INFERENCE_TIMEOUT_SECS"))?,
                connect_secs: parse_opt("INFERENCE_CONNECT_TIMEOUT_SECS", var("INFERENCE_CONNECT_TIMEOUT_SECS"))?,
            },
        };

        let feedback_store = match var("FEEDBACK_URL") {
            None => None,
            Some(url) => {
                let api_key = var("FEEDBACK_API_KEY")
                    .ok_or(ConfigError::MissingVar { var: "FEEDBACK_API_KEY", because: "FEEDBACK_URL" })?;
                Some(FeedbackStoreConfig {
                    base_url: url.trim_end_matches('/').to_owned(),
                    api_key,
                    table: var("FEEDBACK_TABLE").unwrap_or_else(|| DEFAULT_FEEDBACK_TABLE.to_owned()),
                    timeouts: Timeouts {
                        request_secs: parse_opt("FEEDBACK_TIMEOUT_SECS", var("FEEDBACK_TIMEOUT_SECS"))?,
                        connect_secs: None,
                    },
                })
            }
        };

        let feedback_image_prefix_len = parse_or(
            "FEEDBACK_IMAGE_PREFIX_LEN",
            var("FEEDBACK_IMAGE_PREFIX_LEN"),
            DEFAULT_FEEDBACK_IMAGE_PREFIX_LEN,
        )?;

        Ok(Self { bind_addr, port, max_upload_bytes, inference, feedback_store, feedback_image_prefix_len })
    }
}

fn parse_or<T: std::str::FromStr>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    Ok(parse_opt(var, raw)?.unwrap_or(default))
}

fn parse_opt<T: std::str::FromStr>(var: &'static str, raw: Option<String>) -> Result<Option<T>, ConfigError> {
    raw.map(|value| value.parse::<T>().map_err(|_| ConfigError::Invalid { var, value }))
        .transpose()
}

fn parse_mode(raw: Option<String>) -> Result<InferenceMode, ConfigError> {
    match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("http") => Ok(InferenceMode::Http),
        Some("simulate") => Ok(InferenceMode::Simulate),
        Some(_) => Err(ConfigError::Invalid { var: "INFERENCE_MODE", value: raw.unwrap_or_default() }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
