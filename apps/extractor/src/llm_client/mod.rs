//! LLM client layer: the only code that talks to model backends.
//!
//! Three interchangeable backends implement [`LlmProvider`]: OpenAI chat
//! completions, Google Gemini, and a local Ollama server. [`Dispatcher`]
//! routes a résumé text to one of them and always hands back either a JSON
//! string or a typed [`ExtractionError`].
//!
//! Calls are single-shot: no retries, no backoff, no streaming.
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod dispatch;
pub mod gemini;
pub mod ollama;
pub mod openai;
pub mod prompts;

pub use dispatch::{decode_response, Dispatcher, ExtractedResume, ExtractionError};

use prompts::ExtractionPrompt;

/// Upper bound on generated tokens for every backend.
pub const MAX_OUTPUT_TOKENS: u32 = 1500;
/// Extraction is deterministic: always sample at temperature zero.
pub const TEMPERATURE: f32 = 0.0;
/// Per-request timeout shared by every backend.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("API key is missing or still a placeholder (set {0})")]
    MissingCredentials(&'static str),

    #[error("Provider is not configured")]
    NotConfigured,

    #[error("Failed to pull model '{model}': {message}")]
    ModelPull { model: String, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("LLM output is not valid JSON: {raw}")]
    MalformedOutput { raw: String },
}

/// The fixed set of extraction backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Gemini,
    Ollama,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::OpenAi, Provider::Gemini, Provider::Ollama];

    pub fn as_str(self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Gemini => "gemini",
            Provider::Ollama => "ollama",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| ExtractionError::UnknownProvider(s.to_string()))
    }
}

/// One extraction backend. Implementations return the model's raw text; the
/// dispatcher owns fence stripping and JSON validation.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(&self, prompt: &ExtractionPrompt) -> Result<String, LlmError>;

    /// Get the model identifier
    fn model_id(&self) -> &str;
}

/// Builds the process-wide HTTP client shared by all backends.
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    Client::builder().timeout(REQUEST_TIMEOUT).build()
}

/// Turns a non-success response into `LlmError::Api`, pulling the message out
/// of the usual `{"error": {"message": ..}}` or `{"error": ".."}` bodies.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            let error = v.get("error")?;
            error
                .get("message")
                .and_then(|m| m.as_str())
                .or_else(|| error.as_str())
                .map(String::from)
        })
        .unwrap_or(body);

    Err(LlmError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```JSON"))
        .or_else(|| text.strip_prefix("```"));

    match inner {
        Some(stripped) => stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim()),
        None => text.strip_suffix("```").map(str::trim_end).unwrap_or(text),
    }
}
