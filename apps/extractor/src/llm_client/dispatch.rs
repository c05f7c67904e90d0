//! Provider Dispatcher: routes one résumé text to one backend and normalizes
//! whatever comes back.
//!
//! Success is a raw JSON string (fences stripped, syntax checked, not yet
//! mapped onto `ResumeRecord`). Every backend failure is converted into
//! `ExtractionError::Provider`; nothing panics or escapes as another type.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info};

use super::gemini::GeminiProvider;
use super::ollama::OllamaProvider;
use super::openai::OpenAiProvider;
use super::prompts::build_prompt;
use super::{strip_json_fences, LlmError, LlmProvider, Provider};
use crate::config::Config;
use crate::models::resume::{ErrorEnvelope, ResumeRecord};

/// Longest slice of offending model output quoted back in an error.
const RAW_PREVIEW_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Invalid provider specified: {0}. Choose 'openai', 'gemini', or 'ollama'.")]
    UnknownProvider(String),

    #[error("{source}")]
    Provider {
        provider: Provider,
        #[source]
        source: LlmError,
    },

    /// An in-band error envelope received as a response string.
    #[error("{}", .0.message)]
    Reported(ErrorEnvelope),

    #[error("Failed to decode model response: {source}")]
    Decode {
        raw: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ExtractionError {
    /// Provider label for user-facing messages and the envelope.
    pub fn provider_label(&self) -> String {
        match self {
            ExtractionError::UnknownProvider(name) => name.clone(),
            ExtractionError::Provider { provider, .. } => provider.to_string(),
            ExtractionError::Reported(envelope) => envelope.provider.clone(),
            ExtractionError::Decode { .. } => String::new(),
        }
    }

    /// The legacy `{error: true, message, provider}` envelope.
    pub fn envelope(&self) -> ErrorEnvelope {
        match self {
            ExtractionError::Reported(envelope) => envelope.clone(),
            other => ErrorEnvelope::new(other.to_string(), other.provider_label()),
        }
    }
}

/// A successfully decoded response: the JSON exactly as the model produced it
/// (persisted verbatim by the batch runner) plus its typed view.
#[derive(Debug, Clone)]
pub struct ExtractedResume {
    pub raw: Value,
    pub record: ResumeRecord,
}

/// Maps each `Provider` to its backend implementation.
#[derive(Clone, Default)]
pub struct Dispatcher {
    providers: HashMap<Provider, Arc<dyn LlmProvider>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wires all three backends from `config`. Credentials are not checked
    /// here; a missing key fails the first call to that backend.
    pub fn from_config(config: &Config, http: Client) -> Self {
        let mut openai = OpenAiProvider::new(http.clone(), config.openai_api_key.clone());
        if let Some(base_url) = &config.openai_base_url {
            openai = openai.with_base_url(base_url);
        }
        let mut gemini = GeminiProvider::new(http.clone(), config.google_api_key.clone());
        if let Some(base_url) = &config.google_base_url {
            gemini = gemini.with_base_url(base_url);
        }

        Self::new()
            .with_provider(Provider::OpenAi, openai)
            .with_provider(Provider::Gemini, gemini)
            .with_provider(
                Provider::Ollama,
                OllamaProvider::new(
                    http,
                    config.ollama_base_url.clone(),
                    config.ollama_model.clone(),
                ),
            )
    }

    pub fn with_provider(mut self, provider: Provider, backend: impl LlmProvider + 'static) -> Self {
        self.providers.insert(provider, Arc::new(backend));
        self
    }

    /// Sends `text` to `provider` and returns the cleaned JSON text.
    pub async fn dispatch(&self, provider: Provider, text: &str) -> Result<String, ExtractionError> {
        self.call_backend(provider, text).await.map_err(|source| {
            error!("An error occurred with provider {provider}: {source}");
            ExtractionError::Provider { provider, source }
        })
    }

    /// String-tagged entry point used by the CLI and the upload form.
    pub async fn dispatch_named(&self, provider: &str, text: &str) -> Result<String, ExtractionError> {
        let provider: Provider = provider.parse().inspect_err(|e| error!("{e}"))?;
        self.dispatch(provider, text).await
    }

    /// Envelope form of [`Dispatcher::dispatch_named`]: always returns JSON
    /// text, either the model's object or `{"error": true, ...}`.
    pub async fn dispatch_json(&self, provider: &str, text: &str) -> String {
        match self.dispatch_named(provider, text).await {
            Ok(json) => json,
            Err(e) => e.envelope().to_json(),
        }
    }

    /// Dispatches and decodes in one step.
    pub async fn extract(&self, provider: Provider, text: &str) -> Result<ExtractedResume, ExtractionError> {
        let raw = self.dispatch(provider, text).await?;
        decode_response(&raw)
    }

    async fn call_backend(&self, provider: Provider, text: &str) -> Result<String, LlmError> {
        let backend = self.providers.get(&provider).ok_or(LlmError::NotConfigured)?;
        info!("Extracting with {provider} (model: {})", backend.model_id());

        let prompt = build_prompt(text);
        let output = backend.complete(&prompt).await?;

        let cleaned = strip_json_fences(&output);
        if cleaned.is_empty() {
            return Err(LlmError::EmptyContent);
        }
        if serde_json::from_str::<Value>(cleaned).is_err() {
            return Err(LlmError::MalformedOutput {
                raw: cleaned.chars().take(RAW_PREVIEW_CHARS).collect(),
            });
        }

        debug!("{provider} returned {} bytes of JSON", cleaned.len());
        Ok(cleaned.to_string())
    }
}

/// Decodes a dispatcher response string. An in-band error envelope decodes to
/// `ExtractionError::Reported`; anything that is not a JSON object is a
/// decode failure carrying the raw text. Sections of an object that do not
/// fit `ResumeRecord` fall back to their defaults.
pub fn decode_response(raw: &str) -> Result<ExtractedResume, ExtractionError> {
    let decode_err = |source: serde_json::Error| ExtractionError::Decode {
        raw: raw.to_string(),
        source,
    };

    let value: Value = serde_json::from_str(raw).map_err(decode_err)?;
    if let Some(envelope) = ErrorEnvelope::detect(&value) {
        return Err(ExtractionError::Reported(envelope));
    }
    if !value.is_object() {
        return Err(decode_err(serde::de::Error::custom("expected a JSON object")));
    }
    let record: ResumeRecord = serde_json::from_value(value.clone()).map_err(decode_err)?;

    Ok(ExtractedResume { raw: value, record })
}
