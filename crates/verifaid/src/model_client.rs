//! Upstream model client abstraction.
//!
//! The client is synchronous; callers run it on the blocking worker pool.
//! A scripted fake is provided for tests.

use crate::config::ModelConfig;
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::sync::{Mutex, PoisonError};

/// Header carrying the Gemini API key
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Upstream error bodies are cut to this many characters before logging
const MAX_ERROR_BODY_CHARS: usize = 512;

/// One part of a multi-part model request
#[derive(Debug, Clone, PartialEq)]
pub enum PromptPart {
    Text(String),
    /// Inline payload; `data` is base64
    Blob { mime_type: String, data: String },
}

/// Model call errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP {code} from model endpoint: {body}")]
    Status { code: u16, body: String },

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("Model returned empty response")]
    EmptyResponse,

    #[error("Model refused the request: {0}")]
    Blocked(String),

    #[error("Invalid response envelope: {0}")]
    InvalidEnvelope(String),
}

impl ModelError {
    /// Transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            ModelError::Transport(_) | ModelError::Timeout(_) => true,
            ModelError::Status { code, .. } => *code == 429 || *code >= 500,
            _ => false,
        }
    }
}

/// Generative model client trait
pub trait ModelClient: Send + Sync {
    /// Submit all parts as one request and return the model's reply text.
    fn generate(&self, parts: &[PromptPart]) -> Result<String, ModelError>;
}

/// Gemini `generateContent` client over blocking HTTP
pub struct GeminiClient {
    config: ModelConfig,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl GeminiClient {
    /// Build a client. Must be called outside of an async context.
    pub fn new(config: ModelConfig, api_key: String) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }
}

impl ModelClient for GeminiClient {
    fn generate(&self, parts: &[PromptPart]) -> Result<String, ModelError> {
        let response = self
            .client
            .post(self.url())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request_body(parts))
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::Timeout(self.config.timeout_secs)
                } else {
                    ModelError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body: String = response
                .text()
                .unwrap_or_default()
                .chars()
                .take(MAX_ERROR_BODY_CHARS)
                .collect();
            return Err(ModelError::Status {
                code: status.as_u16(),
                body,
            });
        }

        let envelope: Value = response
            .json()
            .map_err(|e| ModelError::InvalidEnvelope(e.to_string()))?;
        extract_text(&envelope)
    }
}

fn request_body(parts: &[PromptPart]) -> Value {
    let parts: Vec<Value> = parts
        .iter()
        .map(|part| match part {
            PromptPart::Text(text) => json!({ "text": text }),
            PromptPart::Blob { mime_type, data } => json!({
                "inline_data": { "mime_type": mime_type, "data": data }
            }),
        })
        .collect();

    json!({ "contents": [{ "role": "user", "parts": parts }] })
}

/// Concatenate the text parts of the first candidate.
fn extract_text(envelope: &Value) -> Result<String, ModelError> {
    let Some(candidate) = envelope.get("candidates").and_then(|c| c.get(0)) else {
        return match envelope
            .pointer("/promptFeedback/blockReason")
            .and_then(Value::as_str)
        {
            Some(reason) => Err(ModelError::Blocked(reason.to_string())),
            None => Err(ModelError::EmptyResponse),
        };
    };

    let text: String = candidate
        .pointer("/content/parts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return match candidate
            .get("finishReason")
            .and_then(Value::as_str)
            .filter(|reason| *reason != "STOP")
        {
            Some(reason) => Err(ModelError::Blocked(reason.to_string())),
            None => Err(ModelError::EmptyResponse),
        };
    }
    Ok(text)
}

/// Fake model client for testing
pub struct FakeModelClient {
    replies: Mutex<Vec<Result<String, ModelError>>>,
    calls: Mutex<Vec<Vec<PromptPart>>>,
}

impl FakeModelClient {
    /// Create a fake client with scripted replies. Replies are consumed in
    /// order; the last one repeats.
    pub fn new(replies: Vec<Result<String, ModelError>>) -> Self {
        Self {
            replies: Mutex::new(replies),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Create a fake client that always answers with `text`
    pub fn always(text: impl Into<String>) -> Self {
        Self::new(vec![Ok(text.into())])
    }

    /// Create a fake client that always fails
    pub fn always_error(error: ModelError) -> Self {
        Self::new(vec![Err(error)])
    }

    /// Get the number of calls made
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Parts submitted by each call, in call order
    pub fn calls(&self) -> Vec<Vec<PromptPart>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl ModelClient for FakeModelClient {
    fn generate(&self, parts: &[PromptPart]) -> Result<String, ModelError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(parts.to_vec());

        let mut replies = self.replies.lock().unwrap_or_else(PoisonError::into_inner);
        match replies.len() {
            0 => Err(ModelError::EmptyResponse),
            1 => replies[0].clone(),
            _ => replies.remove(0),
        }
    }
}
