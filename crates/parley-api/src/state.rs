//! Application state wiring the chat service together.
//!
//! AppState holds the concrete service instance used by both the CLI and the
//! REST API. `ChatService` is generic over the session store; AppState pins it
//! to the configured `SessionBackend`.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use parley_core::chat::assembler::{AssemblerOptions, ConversationAssembler};
use parley_core::chat::service::{ChatService, GenerationSettings};
use parley_infra::llm::{create_provider, resolve_api_key};
use parley_infra::store::SessionBackend;
use parley_types::config::ParleyConfig;
use tokio_util::sync::CancellationToken;

pub type ConcreteChatService = ChatService<SessionBackend>;

/// Shared application state.
///
/// Cloned into every axum handler; the service itself sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    /// Root token. Cancelled on shutdown; every exchange runs under a child.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Open the store and build the model provider described by `config`.
    pub async fn init(config: &ParleyConfig, data_dir: &Path) -> anyhow::Result<Self> {
        let store = open_store(config, data_dir).await?;

        let api_key = resolve_api_key(&config.llm.api_key_env);
        let provider = create_provider(&config.llm, api_key).with_context(|| {
            format!(
                "cannot create '{}' provider (is {} set?)",
                config.llm.provider, config.llm.api_key_env
            )
        })?;

        let service = ChatService::new(
            store,
            provider,
            ConversationAssembler::new(assembler_options(config)),
            generation_settings(config),
            config.assistant.scope,
        );

        Ok(Self::from_service(service))
    }

    /// Wrap an already-built service. Used by `init` and by router tests.
    pub fn from_service(service: ConcreteChatService) -> Self {
        Self {
            chat_service: Arc::new(service),
            shutdown: CancellationToken::new(),
        }
    }

    /// Release store connections.
    pub async fn close(&self) {
        self.chat_service.store().close().await;
    }
}

/// Open the configured session store without touching the model provider.
///
/// Store-only CLI commands use this so they work without an API key.
pub async fn open_store(config: &ParleyConfig, data_dir: &Path) -> anyhow::Result<SessionBackend> {
    SessionBackend::open(&config.store, data_dir)
        .await
        .context("failed to open session store")
}

fn assembler_options(config: &ParleyConfig) -> AssemblerOptions {
    AssemblerOptions {
        system_prompt: config.assistant.system_prompt.clone(),
        history_window: config.assistant.history_window,
    }
}

fn generation_settings(config: &ParleyConfig) -> GenerationSettings {
    GenerationSettings {
        model: config.llm.model.clone(),
        temperature: config.llm.temperature,
        max_tokens: config.llm.max_tokens,
        request_timeout: std::time::Duration::from_secs(config.llm.request_timeout_secs),
    }
}
