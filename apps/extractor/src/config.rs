use std::path::PathBuf;

use anyhow::{bail, Context, Result};

pub const DEFAULT_OLLAMA_MODEL: &str = "llama3";
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Provider keys whose combined absence means there is nothing to talk to.
const PROVIDER_KEYS: [&str; 4] = [
    "OPENAI_API_KEY",
    "GOOGLE_API_KEY",
    "OLLAMA_MODEL",
    "OLLAMA_BASE_URL",
];

/// Application configuration loaded from environment variables (and `.env`).
///
/// Built once in `main` and handed to the dispatcher and app state; nothing
/// reads the environment after startup. Credentials are optional here and
/// validated per provider at call time.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub google_api_key: Option<String>,
    /// Overrides for the hosted API endpoints (proxies, gateways, tests).
    pub openai_base_url: Option<String>,
    pub google_base_url: Option<String>,
    pub ollama_model: String,
    pub ollama_base_url: String,
    pub upload_dir: PathBuf,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Fails only when no
    /// provider setting is present at all.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if PROVIDER_KEYS.iter().all(|key| lookup(key).is_none()) {
            bail!(
                "No provider configuration found. Set at least one of {} \
                 (environment or .env file).",
                PROVIDER_KEYS.join(", ")
            );
        }

        Ok(Config {
            openai_api_key: lookup("OPENAI_API_KEY"),
            google_api_key: lookup("GOOGLE_API_KEY"),
            openai_base_url: lookup("OPENAI_BASE_URL").filter(|u| !u.trim().is_empty()),
            google_base_url: lookup("GOOGLE_BASE_URL").filter(|u| !u.trim().is_empty()),
            ollama_model: lookup("OLLAMA_MODEL")
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
            ollama_base_url: lookup("OLLAMA_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OLLAMA_BASE_URL.to_string()),
            upload_dir: PathBuf::from(lookup("UPLOAD_DIR").unwrap_or_else(|| "__DATA__".to_string())),
            port: lookup("PORT")
                .unwrap_or_else(|| "8000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

/// Returns the credential if it looks real. Empty values and the usual
/// template placeholders (`YOUR_API_KEY`, `<key>`, `changeme`, `xxxx`) are
/// treated as absent.
pub fn usable_credential(value: Option<&str>) -> Option<&str> {
    let value = value?.trim();
    let lower = value.to_lowercase();
    let placeholder = value.is_empty()
        || lower.starts_with("your")
        || (value.starts_with('<') && value.ends_with('>'))
        || lower == "changeme"
        || lower.chars().all(|c| c == 'x' || c == '*' || c == '.');
    (!placeholder).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_total_absence_is_fatal() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "9000")])).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_lookup(lookup_from(&[("GOOGLE_API_KEY", "g-123")])).unwrap();
        assert_eq!(config.google_api_key.as_deref(), Some("g-123"));
        assert_eq!(config.openai_api_key, None);
        assert_eq!(config.ollama_model, DEFAULT_OLLAMA_MODEL);
        assert_eq!(config.ollama_base_url, DEFAULT_OLLAMA_BASE_URL);
        assert_eq!(config.upload_dir, PathBuf::from("__DATA__"));
        assert_eq!(config.port, 8000);
        assert_eq!(config.openai_base_url, None);
        assert_eq!(config.google_base_url, None);
    }

    #[test]
    fn test_bad_port_rejected() {
        let result = Config::from_lookup(lookup_from(&[
            ("OLLAMA_MODEL", "mistral"),
            ("PORT", "not-a-port"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_placeholder_credentials_are_unusable() {
        assert_eq!(usable_credential(None), None);
        assert_eq!(usable_credential(Some("")), None);
        assert_eq!(usable_credential(Some("YOUR_OPENAI_API_KEY")), None);
        assert_eq!(usable_credential(Some("<google-key>")), None);
        assert_eq!(usable_credential(Some("xxxxxxxx")), None);
        assert_eq!(usable_credential(Some(" sk-live-abc ")), Some("sk-live-abc"));
    }
}
