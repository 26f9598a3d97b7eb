//! Conversation assembly for model requests.
//!
//! Turns stored history plus the incoming user text into the bounded,
//! role-tagged message list sent to the model. History is expected in
//! chronological order; `merge_sessions` produces that order when several
//! sessions feed one request.

use parley_types::chat::{ChatMessage, ChatSession};
use parley_types::error::ChatError;
use parley_types::llm::Message;

/// Per-deployment assembly settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssemblerOptions {
    /// Fixed instruction placed ahead of every conversation.
    pub system_prompt: Option<String>,
    /// Keep only the last K turns (the new user turn included).
    pub history_window: Option<usize>,
}

/// Builds model-ready message lists. Stateless apart from its options.
#[derive(Debug, Clone, Default)]
pub struct ConversationAssembler {
    options: AssemblerOptions,
}

impl ConversationAssembler {
    pub fn new(options: AssemblerOptions) -> Self {
        let system_prompt = options
            .system_prompt
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        Self {
            options: AssemblerOptions {
                system_prompt,
                history_window: options.history_window,
            },
        }
    }

    pub fn options(&self) -> &AssemblerOptions {
        &self.options
    }

    /// Assemble `history` followed by the trimmed `new_user_text`.
    ///
    /// Fails with a validation error when the text is blank.
    pub fn assemble(
        &self,
        history: &[ChatMessage],
        new_user_text: &str,
    ) -> Result<Vec<Message>, ChatError> {
        let text = validate_user_text(new_user_text)?;

        let mut turns: Vec<Message> = history.iter().map(Message::from).collect();
        turns.push(Message::user(text));
        let turns = self.window(&turns);

        let mut messages = Vec::with_capacity(turns.len() + 1);
        if let Some(prompt) = &self.options.system_prompt {
            messages.push(Message::system(prompt.clone()));
        }
        messages.extend_from_slice(turns);
        Ok(messages)
    }

    /// The suffix of `turns` allowed by the configured window.
    pub fn window<'a, T>(&self, turns: &'a [T]) -> &'a [T] {
        match self.options.history_window {
            Some(k) => {
                let k = k.max(1);
                &turns[turns.len().saturating_sub(k)..]
            }
            None => turns,
        }
    }
}

/// Trim user input, rejecting empty text.
pub fn validate_user_text(text: &str) -> Result<&str, ChatError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ChatError::Validation("Message is required".to_string()));
    }
    Ok(trimmed)
}

/// Flatten several sessions into one timestamp-ordered history.
///
/// The sort is stable, so equal timestamps keep store order.
pub fn merge_sessions(sessions: &[ChatSession]) -> Vec<ChatMessage> {
    let mut merged: Vec<ChatMessage> = sessions
        .iter()
        .flat_map(|s| s.messages.iter().cloned())
        .collect();
    merged.sort_by_key(|m| m.timestamp);
    merged
}
