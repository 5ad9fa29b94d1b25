//! Minimal HTTP transport for the Gemini `v1beta` REST API.
//!
//! Both upstream operations used by the pipeline (`:embedContent` and `:generateContent`) are
//! plain JSON POSTs authenticated with an API key query parameter. This module owns the shared
//! `reqwest::Client` (with its per-call timeout) and maps every transport-level failure into
//! [`GeminiError`], which the pipeline reports as `GEMINI_FAILED`.

use crate::config::Config;
use crate::error::ErrorCode;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by Gemini-backed clients.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// Caller supplied blank text.
    #[error("Input text is empty")]
    EmptyInput,
    /// `GEMINI_API_KEY` was not configured.
    #[error("Gemini API key is not configured")]
    MissingApiKey,
    /// HTTP layer failed before a response arrived (connect, timeout, decode).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Gemini answered with a non-success status.
    #[error("Unexpected Gemini response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by Gemini.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Response body did not have the expected shape.
    #[error("Malformed Gemini response: {0}")]
    InvalidResponse(String),
}

impl GeminiError {
    /// Every upstream failure is reported under one code.
    pub fn code(&self) -> ErrorCode {
        ErrorCode::GeminiFailed
    }
}

/// Shared Gemini HTTP client.
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl GeminiClient {
    /// Construct a client from configuration, applying the per-call timeout.
    pub fn from_config(config: &Config) -> Result<Self, GeminiError> {
        let http = Client::builder()
            .user_agent("pdf-summary/0.1")
            .timeout(Duration::from_secs(config.gemini_timeout_secs))
            .build()?;
        tracing::debug!(
            url = %config.gemini_base_url,
            has_api_key = config.gemini_api_key.is_some(),
            timeout_secs = config.gemini_timeout_secs,
            "Initialized Gemini HTTP client"
        );
        Ok(Self {
            http,
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            api_key: config.gemini_api_key.clone(),
        })
    }

    /// POST `payload` to `models/{model}:{method}` and return the decoded JSON body.
    pub async fn post_model(
        &self,
        model: &str,
        method: &str,
        payload: &Value,
    ) -> Result<Value, GeminiError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(GeminiError::MissingApiKey)?;
        let url = self.model_url(model, method);

        let response = self
            .http
            .post(&url)
            .query(&[("key", api_key)])
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeminiError::UnexpectedStatus { status, body });
        }

        response
            .json::<Value>()
            .await
            .map_err(|error| GeminiError::InvalidResponse(format!("body is not JSON: {error}")))
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        let model = model.trim().trim_start_matches("models/");
        format!("{}/models/{model}:{method}", self.base_url)
    }
}
