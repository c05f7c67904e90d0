//! Local Ollama backend. Before chatting it makes sure the configured model is
//! present on the server, pulling it when it is not.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::prompts::ExtractionPrompt;
use super::{ensure_success, LlmError, LlmProvider, MAX_OUTPUT_TOKENS, TEMPERATURE};

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<LocalModel>,
}

#[derive(Debug, Deserialize)]
struct LocalModel {
    name: String,
}

#[derive(Debug, Serialize)]
struct PullRequest<'a> {
    model: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct PullResponse {
    #[serde(default)]
    status: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    stream: bool,
    format: &'static str,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ChatReply>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: String,
}

pub struct OllamaProvider {
    http: Client,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    pub fn new(http: Client, base_url: String, model: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        }
    }

    /// Checks `/api/tags` and pulls the model if the server does not have it.
    async fn ensure_model(&self) -> Result<(), LlmError> {
        let response = self
            .http
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await?;
        let tags: TagsResponse = ensure_success(response).await?.json().await?;

        if tags.models.iter().any(|m| same_model(&m.name, &self.model)) {
            debug!("Ollama model '{}' already present", self.model);
            return Ok(());
        }

        info!("Ollama model '{}' not found locally, pulling...", self.model);
        let response = self
            .http
            .post(format!("{}/api/pull", self.base_url))
            .json(&PullRequest {
                model: &self.model,
                stream: false,
            })
            .send()
            .await?;

        let pull_failed = |message: String| LlmError::ModelPull {
            model: self.model.clone(),
            message,
        };
        let response = ensure_success(response).await.map_err(|e| pull_failed(e.to_string()))?;
        let pulled: PullResponse = response.json().await?;
        if pulled.status != "success" {
            return Err(pull_failed(format!("unexpected status '{}'", pulled.status)));
        }

        info!("Pulled Ollama model '{}'", self.model);
        Ok(())
    }
}

/// Ollama reports `llama3` as `llama3:latest`; treat the two as equal.
fn same_model(listed: &str, wanted: &str) -> bool {
    let normalize = |name: &str| {
        if name.contains(':') {
            name.to_string()
        } else {
            format!("{name}:latest")
        }
    };
    normalize(listed) == normalize(wanted)
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn complete(&self, prompt: &ExtractionPrompt) -> Result<String, LlmError> {
        self.ensure_model().await?;

        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            stream: false,
            format: "json",
            options: ChatOptions {
                temperature: TEMPERATURE,
                num_predict: MAX_OUTPUT_TOKENS,
            },
        };

        let response = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await?;
        let response: ChatResponse = ensure_success(response).await?.json().await?;

        response
            .message
            .map(|m| m.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyContent)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
