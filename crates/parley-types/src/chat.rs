//! Chat session and message types for Parley.
//!
//! A session is a named conversation thread keyed by an opaque string. It
//! owns an append-only list of messages, each attributed to the user or the
//! assistant. Wire names are camelCase to match what the chat widget expects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::llm::{Message, MessageRole};

/// Longest session identifier a client may supply.
pub const MAX_SESSION_ID_LEN: usize = 128;

/// Who authored a stored turn.
///
/// Stored conversations only ever contain user and assistant turns; the
/// system instruction is injected at request time and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for ChatRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(ChatRole::User),
            "assistant" => Ok(ChatRole::Assistant),
            other => Err(format!("invalid chat role: '{other}'")),
        }
    }
}

impl From<ChatRole> for MessageRole {
    fn from(role: ChatRole) -> Self {
        match role {
            ChatRole::User => MessageRole::User,
            ChatRole::Assistant => MessageRole::Assistant,
        }
    }
}

/// A single turn within a chat session. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a message with a fresh id stamped with the current time.
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}

impl From<&ChatMessage> for Message {
    fn from(message: &ChatMessage) -> Self {
        Message {
            role: message.role.into(),
            content: message.content.clone(),
        }
    }
}

/// A persisted conversation thread.
///
/// `session_id` is the natural key; the store holds at most one session per id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub session_id: String,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// An empty session that has not been written yet.
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id.clone(),
            message_count: self.messages.len() as u32,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Session metadata without its messages, used for listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub message_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The two turns produced by one successful exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeOutcome {
    pub user_message: ChatMessage,
    pub assistant_message: ChatMessage,
    pub session_id: String,
}

/// A history read: the messages plus the session they belong to.
///
/// `session_id` is `None` when the messages span every session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryView {
    pub messages: Vec<ChatMessage>,
    pub session_id: Option<String>,
}

/// What a clear operation removes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearTarget {
    Session(String),
    All,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_role_roundtrip() {
        for role in [ChatRole::User, ChatRole::Assistant] {
            let parsed: ChatRole = role.to_string().parse().unwrap();
            assert_eq!(role, parsed);
        }
        assert!("system".parse::<ChatRole>().is_err());
    }

    #[test]
    fn test_chat_role_maps_to_llm_role() {
        assert_eq!(MessageRole::from(ChatRole::User), MessageRole::User);
        assert_eq!(MessageRole::from(ChatRole::Assistant), MessageRole::Assistant);
    }

    #[test]
    fn test_message_constructors() {
        let user = ChatMessage::user("hello");
        let assistant = ChatMessage::assistant("hi");
        assert_eq!(user.role, ChatRole::User);
        assert_eq!(assistant.role, ChatRole::Assistant);
        assert_ne!(user.id, assistant.id);
    }

    #[test]
    fn test_message_wire_shape() {
        let msg = ChatMessage::user("hello");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "hello");
        assert!(json["id"].is_string());
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_session_wire_shape_is_camel_case() {
        let mut session = ChatSession::new("session_abc");
        session.messages.push(ChatMessage::user("hello"));
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["sessionId"], "session_abc");
        assert!(json["createdAt"].is_string());
        assert!(json["updatedAt"].is_string());
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_summary_counts_messages() {
        let mut session = ChatSession::new("s1");
        session.messages.push(ChatMessage::user("a"));
        session.messages.push(ChatMessage::assistant("b"));
        let summary = session.summary();
        assert_eq!(summary.session_id, "s1");
        assert_eq!(summary.message_count, 2);
    }

    #[test]
    fn test_broadcast_history_serializes_null_session() {
        let view = HistoryView {
            messages: vec![],
            session_id: None,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert!(json["sessionId"].is_null());
        assert!(json["messages"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_exchange_outcome_wire_names() {
        let outcome = ExchangeOutcome {
            user_message: ChatMessage::user("q"),
            assistant_message: ChatMessage::assistant("a"),
            session_id: "s1".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert!(json.get("userMessage").is_some());
        assert!(json.get("assistantMessage").is_some());
        assert_eq!(json["sessionId"], "s1");
    }
}
