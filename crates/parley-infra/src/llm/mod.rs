//! LLM provider construction.
//!
//! [`create_provider`] turns the `[llm]` configuration section into a
//! [`BoxLlmProvider`]; [`resolve_api_key`] reads the key from the
//! environment variable the configuration names.

pub mod openai_compat;

use secrecy::SecretString;

use parley_core::llm::box_provider::BoxLlmProvider;
use parley_types::config::LlmConfig;
use parley_types::llm::{LlmError, ProviderType};

use self::openai_compat::OpenAiCompatibleProvider;

/// Read an API key from the environment variable `env_name`.
///
/// Unset, empty, and non-Unicode values all count as missing.
pub fn resolve_api_key(env_name: &str) -> Option<SecretString> {
    match std::env::var(env_name) {
        Ok(val) if !val.trim().is_empty() => Some(SecretString::from(val.trim().to_string())),
        _ => None,
    }
}

/// Create a [`BoxLlmProvider`] from the `[llm]` section.
///
/// # Errors
///
/// `AuthenticationFailed` when no API key is available, and
/// `InvalidRequest` when `openai_compatible` is selected without a `base_url`.
pub fn create_provider(
    config: &LlmConfig,
    api_key: Option<SecretString>,
) -> Result<BoxLlmProvider, LlmError> {
    let key = api_key.ok_or(LlmError::AuthenticationFailed)?;

    let provider = match (config.provider, config.base_url.as_deref()) {
        (ProviderType::OpenAiCompatible, None) => {
            return Err(LlmError::InvalidRequest(
                "provider 'openai_compatible' requires llm.base_url".to_string(),
            ));
        }
        (_, Some(base_url)) => {
            let mut oai_config = match config.provider {
                ProviderType::Gemini => openai_compat::config::gemini_defaults(key, &config.model),
                ProviderType::OpenAi => openai_compat::config::openai_defaults(key, &config.model),
                ProviderType::OpenAiCompatible => {
                    openai_compat::config::custom_defaults(key, base_url, &config.model)
                }
            };
            oai_config.base_url = base_url.trim_end_matches('/').to_string();
            OpenAiCompatibleProvider::new(oai_config)
        }
        (ProviderType::Gemini, None) => OpenAiCompatibleProvider::gemini(key, &config.model),
        (ProviderType::OpenAi, None) => OpenAiCompatibleProvider::openai(key, &config.model),
    };

    tracing::debug!(provider = %config.provider, model = %config.model, "LLM provider created");
    Ok(BoxLlmProvider::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> Option<SecretString> {
        Some(SecretString::from("test-key".to_string()))
    }

    #[test]
    fn test_default_config_builds_gemini() {
        let provider = create_provider(&LlmConfig::default(), key()).unwrap();
        assert_eq!(provider.name(), "gemini");
        assert!(provider.capabilities().streaming);
    }

    #[test]
    fn test_openai_provider() {
        let config = LlmConfig {
            provider: ProviderType::OpenAi,
            model: "gpt-4o-mini".to_string(),
            ..Default::default()
        };
        let provider = create_provider(&config, key()).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_custom_provider_requires_base_url() {
        let mut config = LlmConfig {
            provider: ProviderType::OpenAiCompatible,
            ..Default::default()
        };
        assert!(matches!(
            create_provider(&config, key()),
            Err(LlmError::InvalidRequest(_))
        ));

        config.base_url = Some("http://localhost:11434/v1".to_string());
        let provider = create_provider(&config, key()).unwrap();
        assert_eq!(provider.name(), "openai_compatible");
    }

    #[test]
    fn test_base_url_override_keeps_provider_name() {
        let config = LlmConfig {
            base_url: Some("https://proxy.example.com/gemini/".to_string()),
            ..Default::default()
        };
        let provider = create_provider(&config, key()).unwrap();
        assert_eq!(provider.name(), "gemini");
    }

    #[test]
    fn test_missing_key_is_authentication_failure() {
        let result = create_provider(&LlmConfig::default(), None);
        assert!(matches!(result, Err(LlmError::AuthenticationFailed)));
    }

    #[test]
    fn test_resolve_api_key_missing_var() {
        assert!(resolve_api_key("PARLEY_TEST_SURELY_UNSET_API_KEY").is_none());
    }
}
