use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::config::usable_credential;
use crate::llm_client::Provider;
use crate::state::AppState;

/// GET /health
/// Service version plus the providers that can be called right now. Ollama is
/// always listed; its reachability is only known at call time.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let config = &state.config;
    let providers: Vec<&str> = Provider::ALL
        .into_iter()
        .filter(|provider| match provider {
            Provider::OpenAi => usable_credential(config.openai_api_key.as_deref()).is_some(),
            Provider::Gemini => usable_credential(config.google_api_key.as_deref()).is_some(),
            Provider::Ollama => true,
        })
        .map(Provider::as_str)
        .collect();

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "resume-extractor",
        "providers": providers,
    }))
}
