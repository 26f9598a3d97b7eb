//! Deployment configuration types for Parley.
//!
//! `ParleyConfig` represents `parley.toml`. Every section and field has a
//! default, so an empty file (or no file at all) yields a working setup that
//! talks to Gemini and stores sessions in SQLite under the data directory.

use serde::{Deserialize, Serialize};

use crate::llm::ProviderType;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParleyConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Which session store backs the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// SQLite URL. When absent, `parley.db` in the data directory is used.
    #[serde(default)]
    pub database_url: Option<String>,
}

/// Whether history is per session or shared across every session.
///
/// `Broadcast` is the variant where reads without a session id return (and
/// the model sees) every stored message merged by timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryScope {
    #[default]
    Session,
    Broadcast,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Fixed instruction prepended to every model request (branded mode).
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Keep only the most recent K stored turns in each request.
    #[serde(default)]
    pub history_window: Option<usize>,
    #[serde(default)]
    pub scope: HistoryScope,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: ProviderType,
    #[serde(default = "default_model")]
    pub model: String,
    /// Override the provider's default base URL. Required for `openai_compatible`.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_provider() -> ProviderType {
    ProviderType::Gemini
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON log lines instead of human-readable ones.
    #[serde(default)]
    pub json: bool,
    /// Export spans to stdout through OpenTelemetry.
    #[serde(default)]
    pub otel: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_widget_backend() {
        let config = ParleyConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert!(config.store.database_url.is_none());
        assert_eq!(config.assistant.scope, HistoryScope::Session);
        assert!(config.assistant.history_window.is_none());
        assert_eq!(config.llm.provider, ProviderType::Gemini);
        assert_eq!(config.llm.model, "gemini-1.5-flash");
        assert!((config.llm.temperature - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.llm.max_tokens, 1000);
        assert_eq!(config.llm.request_timeout_secs, 60);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: ParleyConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.llm.api_key_env, "GEMINI_API_KEY");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_partial_toml() {
        let toml_str = r#"
[store]
backend = "memory"

[assistant]
system_prompt = "You are the Acme support assistant."
history_window = 10
scope = "broadcast"

[llm]
provider = "openai"
model = "gpt-4o-mini"
api_key_env = "OPENAI_API_KEY"
"#;
        let config: ParleyConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.assistant.history_window, Some(10));
        assert_eq!(config.assistant.scope, HistoryScope::Broadcast);
        assert_eq!(config.llm.provider, ProviderType::OpenAi);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        // Untouched fields keep their defaults
        assert_eq!(config.llm.max_tokens, 1000);
        assert_eq!(config.server.port, 3000);
    }
}
