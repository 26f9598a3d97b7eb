//! Configuration and per-provider defaults for OpenAI-compatible providers.
//!
//! Each hosted API that speaks the OpenAI chat completions protocol gets a
//! factory returning an [`OpenAiCompatConfig`] with its base URL and
//! capabilities.

use parley_types::llm::ProviderCapabilities;
use secrecy::SecretString;

/// Base URL of Gemini's OpenAI-compatible endpoint.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// Base URL of the OpenAI API.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Configuration for an OpenAI-compatible LLM provider.
///
/// Used to construct an [`super::OpenAiCompatibleProvider`].
pub struct OpenAiCompatConfig {
    /// Provider name used in logs and spans (e.g., "gemini").
    pub provider_name: String,
    pub base_url: String,
    pub api_key: SecretString,
    /// Model used when a request leaves `model` empty.
    pub model: String,
    pub capabilities: ProviderCapabilities,
}

/// Google Gemini through its OpenAI-compatible beta endpoint.
///
/// Capabilities: streaming; 1M context, 8K output.
pub fn gemini_defaults(api_key: SecretString, model: &str) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "gemini".into(),
        base_url: GEMINI_BASE_URL.into(),
        api_key,
        model: model.into(),
        capabilities: ProviderCapabilities {
            streaming: true,
            max_output_tokens: 8_192,
        },
    }
}

/// OpenAI.
///
/// Capabilities: streaming; 128K context, 16K output.
pub fn openai_defaults(api_key: SecretString, model: &str) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "openai".into(),
        base_url: OPENAI_BASE_URL.into(),
        api_key,
        model: model.into(),
        capabilities: ProviderCapabilities {
            streaming: true,
            max_output_tokens: 16_384,
        },
    }
}

/// Any other server speaking the protocol (local gateways, proxies).
///
/// Capabilities are conservative since nothing is known about the backend.
pub fn custom_defaults(api_key: SecretString, base_url: &str, model: &str) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "openai_compatible".into(),
        base_url: base_url.trim_end_matches('/').into(),
        api_key,
        model: model.into(),
        capabilities: ProviderCapabilities {
            streaming: true,
            max_output_tokens: 4_096,
        },
    }
}
