//! Chat service: the exchange handler plus history and clear operations.
//!
//! ChatService owns the session store, the model provider, and the
//! conversation assembler. One exchange reads history, asks the model for a
//! reply, and appends the user turn together with the reply in a single
//! store write. Nothing is written when validation or the model call fails.

use std::time::Duration;

use chrono::Utc;
use parley_types::chat::{
    ChatMessage, ChatSession, ClearTarget, ExchangeOutcome, HistoryView, SessionSummary,
};
use parley_types::config::HistoryScope;
use parley_types::error::ChatError;
use parley_types::llm::{CompletionRequest, LlmError, Message};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, field, info, info_span};

use crate::chat::assembler::{ConversationAssembler, merge_sessions, validate_user_text};
use crate::chat::session::{new_session_id, normalize_session_id};
use crate::chat::store::SessionStore;
use crate::llm::box_provider::BoxLlmProvider;
use crate::llm::collect::collect_reply;

/// Model parameters applied to every exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Upper bound on the whole model call, streaming included.
    pub request_timeout: Duration,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Orchestrates exchanges, history reads, and clears.
///
/// Generic over `SessionStore` so parley-core never depends on parley-infra.
pub struct ChatService<S: SessionStore> {
    store: S,
    provider: BoxLlmProvider,
    assembler: ConversationAssembler,
    generation: GenerationSettings,
    scope: HistoryScope,
}

impl<S: SessionStore> ChatService<S> {
    pub fn new(
        store: S,
        provider: BoxLlmProvider,
        assembler: ConversationAssembler,
        generation: GenerationSettings,
        scope: HistoryScope,
    ) -> Self {
        Self {
            store,
            provider,
            assembler,
            generation,
            scope,
        }
    }

    /// Access the session store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn provider(&self) -> &BoxLlmProvider {
        &self.provider
    }

    pub fn scope(&self) -> HistoryScope {
        self.scope
    }

    // --- Exchange ---

    /// Run one request/response cycle.
    ///
    /// Validates `text`, resolves (or mints) the session id, asks the model
    /// for a reply over the assembled history, then appends both turns in one
    /// write. `cancel` aborts the model call; a cancelled exchange writes
    /// nothing.
    pub async fn handle_exchange(
        &self,
        session_id: Option<&str>,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<ExchangeOutcome, ChatError> {
        let text = validate_user_text(text)?;

        let (session_id, minted) = match normalize_session_id(session_id)? {
            Some(id) => (id.to_string(), false),
            None => (new_session_id(), true),
        };

        let user_message = ChatMessage::user(text);

        let history = self.exchange_history(&session_id, minted).await.map_err(|e| {
            error!(session_id = %session_id, operation = "exchange", error = %e, "Failed to load history");
            e
        })?;
        let messages = self.assembler.assemble(&history, text)?;

        let reply = self.generate(messages, cancel).await.map_err(|e| {
            error!(session_id = %session_id, operation = "exchange", error = %e, "Model call failed");
            ChatError::Upstream(e)
        })?;

        let assistant_message = ChatMessage::assistant(reply);

        self.store
            .append_messages(
                &session_id,
                &[user_message.clone(), assistant_message.clone()],
                Utc::now(),
            )
            .await
            .map_err(|e| {
                error!(session_id = %session_id, operation = "exchange", error = %e, "Failed to persist exchange");
                ChatError::Store(e)
            })?;

        info!(
            session_id = %session_id,
            new_session = minted,
            reply_chars = assistant_message.content.len(),
            "Exchange completed"
        );

        Ok(ExchangeOutcome {
            user_message,
            assistant_message,
            session_id,
        })
    }

    /// History fed to the assembler for one exchange (pre-append).
    async fn exchange_history(
        &self,
        session_id: &str,
        minted: bool,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        match self.scope {
            HistoryScope::Broadcast => {
                let sessions = self.store.list_sessions().await?;
                Ok(merge_sessions(&sessions))
            }
            HistoryScope::Session if minted => Ok(Vec::new()),
            HistoryScope::Session => Ok(self
                .store
                .find_session(session_id)
                .await?
                .map(|s| s.messages)
                .unwrap_or_default()),
        }
    }

    /// Ask the model for a reply and return its trimmed text.
    ///
    /// Streaming providers are drained fragment by fragment; others are
    /// awaited whole. Both paths share the request timeout and `cancel`.
    async fn generate(
        &self,
        messages: Vec<Message>,
        cancel: &CancellationToken,
    ) -> Result<String, LlmError> {
        let streaming = self.provider.capabilities().streaming;
        let timeout = self.generation.request_timeout;
        let request = CompletionRequest {
            model: self.generation.model.clone(),
            messages,
            system: None,
            max_tokens: self.generation.max_tokens,
            temperature: Some(self.generation.temperature),
            stream: streaming,
        };

        let span = info_span!(
            "gen_ai.chat",
            gen_ai.system = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = ?request.temperature,
            gen_ai.request.stream = streaming,
            gen_ai.usage.input_tokens = field::Empty,
            gen_ai.usage.output_tokens = field::Empty,
        );

        let text = if streaming {
            let stream = self.provider.stream(request);
            let reply = collect_reply(stream, timeout, cancel)
                .instrument(span.clone())
                .await?;
            if let Some(usage) = &reply.usage {
                span.record("gen_ai.usage.input_tokens", usage.input_tokens);
                span.record("gen_ai.usage.output_tokens", usage.output_tokens);
            }
            reply.text
        } else {
            let call = self.provider.complete(&request).instrument(span.clone());
            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(LlmError::Cancelled),
                result = tokio::time::timeout(timeout, call) => {
                    result.map_err(|_| LlmError::Timeout(timeout))??
                }
            };
            span.record("gen_ai.usage.input_tokens", response.usage.input_tokens);
            span.record("gen_ai.usage.output_tokens", response.usage.output_tokens);
            response.content
        };

        let text = text.trim();
        if text.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        debug!(chars = text.len(), "Model reply collected");
        Ok(text.to_string())
    }

    // --- History ---

    /// Messages of one session; empty when the session does not exist.
    pub async fn get_history(&self, session_id: &str) -> Result<Vec<ChatMessage>, ChatError> {
        let Some(id) = normalize_session_id(Some(session_id))? else {
            return Err(ChatError::Validation("Session ID is required".to_string()));
        };
        let session = self.store.find_session(id).await.map_err(|e| {
            error!(session_id = %id, operation = "history", error = %e, "Failed to fetch chat history");
            ChatError::Store(e)
        })?;
        Ok(session.map(|s| s.messages).unwrap_or_default())
    }

    /// Every stored message across all sessions, oldest first.
    pub async fn get_all_history(&self) -> Result<Vec<ChatMessage>, ChatError> {
        let sessions = self.store.list_sessions().await.map_err(|e| {
            error!(operation = "history", error = %e, "Failed to fetch chat history");
            ChatError::Store(e)
        })?;
        Ok(merge_sessions(&sessions))
    }

    /// History read honoring the configured scope.
    ///
    /// Without a session id, broadcast scope returns everything and session
    /// scope rejects the request.
    pub async fn history(&self, session_id: Option<&str>) -> Result<HistoryView, ChatError> {
        match (normalize_session_id(session_id)?, self.scope) {
            (Some(id), _) => Ok(HistoryView {
                messages: self.get_history(id).await?,
                session_id: Some(id.to_string()),
            }),
            (None, HistoryScope::Broadcast) => Ok(HistoryView {
                messages: self.get_all_history().await?,
                session_id: None,
            }),
            (None, HistoryScope::Session) => {
                Err(ChatError::Validation("Session ID is required".to_string()))
            }
        }
    }

    /// Load a session that must exist.
    pub async fn get_session(&self, session_id: &str) -> Result<ChatSession, ChatError> {
        let Some(id) = normalize_session_id(Some(session_id))? else {
            return Err(ChatError::Validation("Session ID is required".to_string()));
        };
        self.store
            .find_session(id)
            .await?
            .ok_or_else(|| ChatError::NotFound(format!("session '{id}'")))
    }

    /// Session summaries, most recently updated first.
    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>, ChatError> {
        Ok(self.store.list_summaries().await?)
    }

    // --- Clear ---

    /// Map an optional session id to a clear target under the current scope.
    pub fn clear_target(&self, session_id: Option<&str>) -> Result<ClearTarget, ChatError> {
        match (normalize_session_id(session_id)?, self.scope) {
            (Some(id), _) => Ok(ClearTarget::Session(id.to_string())),
            (None, HistoryScope::Broadcast) => Ok(ClearTarget::All),
            (None, HistoryScope::Session) => {
                Err(ChatError::Validation("Session ID is required".to_string()))
            }
        }
    }

    /// Remove the target session(s). Returns how many sessions were removed.
    ///
    /// Clearing a session that does not exist succeeds with 0.
    pub async fn clear(&self, target: ClearTarget) -> Result<u64, ChatError> {
        let removed = match &target {
            ClearTarget::Session(id) => u64::from(self.store.delete_session(id).await.map_err(
                |e| {
                    error!(session_id = %id, operation = "clear", error = %e, "Failed to clear chat history");
                    ChatError::Store(e)
                },
            )?),
            ClearTarget::All => self.store.delete_all().await.map_err(|e| {
                error!(operation = "clear", error = %e, "Failed to clear chat history");
                ChatError::Store(e)
            })?,
        };
        info!(clear_target = ?target, removed, "Chat history cleared");
        Ok(removed)
    }
}
