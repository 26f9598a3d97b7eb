//! In-memory session store backed by `DashMap`.
//!
//! Sessions live for the lifetime of the process. Reads clone out of the map
//! so no `DashMap` guard outlives the call; appends mutate under the entry
//! lock, which makes each append atomic per session.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parley_core::chat::store::SessionStore;
use parley_types::chat::{ChatMessage, ChatSession, SessionSummary};
use parley_types::error::RepositoryError;

/// Process-local `SessionStore`. Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<DashMap<String, ChatSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    async fn find_session(&self, session_id: &str) -> Result<Option<ChatSession>, RepositoryError> {
        Ok(self.sessions.get(session_id).map(|s| s.value().clone()))
    }

    async fn list_sessions(&self) -> Result<Vec<ChatSession>, RepositoryError> {
        let mut sessions: Vec<ChatSession> =
            self.sessions.iter().map(|s| s.value().clone()).collect();
        sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(sessions)
    }

    async fn list_summaries(&self) -> Result<Vec<SessionSummary>, RepositoryError> {
        let mut summaries: Vec<SessionSummary> =
            self.sessions.iter().map(|s| s.value().summary()).collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    async fn append_messages(
        &self,
        session_id: &str,
        messages: &[ChatMessage],
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut entry = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                let mut session = ChatSession::new(session_id);
                session.created_at = messages.first().map(|m| m.timestamp).unwrap_or(updated_at);
                session
            });
        entry.messages.extend_from_slice(messages);
        entry.updated_at = updated_at;
        Ok(())
    }

    async fn delete_session(&self, session_id: &str) -> Result<bool, RepositoryError> {
        Ok(self.sessions.remove(session_id).is_some())
    }

    async fn delete_all(&self) -> Result<u64, RepositoryError> {
        let removed = self.sessions.len() as u64;
        self.sessions.clear();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::chat::ChatRole;

    #[tokio::test]
    async fn test_append_and_find() {
        let store = MemorySessionStore::new();
        let turns = [ChatMessage::user("hi"), ChatMessage::assistant("hello")];
        store.append_messages("s1", &turns, Utc::now()).await.unwrap();

        let session = store.find_session("s1").await.unwrap().unwrap();
        assert_eq!(session.messages, turns.to_vec());
        assert!(store.find_session("s2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemorySessionStore::new();
        let other = store.clone();
        store
            .append_messages("s1", &[ChatMessage::user("hi")], Utc::now())
            .await
            .unwrap();
        assert_eq!(other.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_all_kept() {
        let store = MemorySessionStore::new();
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let turns = [
                    ChatMessage::user(format!("q{i}")),
                    ChatMessage::assistant(format!("a{i}")),
                ];
                store.append_messages("shared", &turns, Utc::now()).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let session = store.find_session("shared").await.unwrap().unwrap();
        assert_eq!(session.messages.len(), 32);
        for pair in session.messages.chunks(2) {
            assert_eq!(pair[0].role, ChatRole::User);
            assert_eq!(pair[1].role, ChatRole::Assistant);
            assert_eq!(pair[0].content[1..], pair[1].content[1..]);
        }
    }

    #[tokio::test]
    async fn test_summaries_and_deletes() {
        let store = MemorySessionStore::new();
        let t = Utc::now();
        store.append_messages("old", &[ChatMessage::user("a")], t).await.unwrap();
        store
            .append_messages("new", &[ChatMessage::user("b")], t + chrono::Duration::seconds(1))
            .await
            .unwrap();

        let summaries = store.list_summaries().await.unwrap();
        assert_eq!(summaries[0].session_id, "new");
        assert_eq!(summaries[1].message_count, 1);

        assert!(store.delete_session("old").await.unwrap());
        assert!(!store.delete_session("old").await.unwrap());
        assert_eq!(store.delete_all().await.unwrap(), 1);
        assert!(store.is_empty());
    }
}
