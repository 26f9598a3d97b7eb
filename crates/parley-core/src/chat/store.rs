//! SessionStore trait definition.
//!
//! Persistence port for chat sessions. Implementations live in parley-infra
//! (`SqliteSessionStore`, `MemorySessionStore`).
//! Uses native async fn in traits (RPITIT, Rust 2024 edition).

use chrono::{DateTime, Utc};
use parley_types::chat::{ChatMessage, ChatSession, SessionSummary};
use parley_types::error::RepositoryError;

/// Storage of chat sessions keyed by session id.
///
/// Writes go through `append_messages`, which must be atomic per call: the
/// session row is created if missing and every message lands after whatever
/// the session already holds, even when two callers append concurrently.
pub trait SessionStore: Send + Sync {
    /// Load one session with its messages in submission order.
    fn find_session(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// Load every session with its messages.
    fn list_sessions(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<ChatSession>, RepositoryError>> + Send;

    /// Session metadata ordered by `updated_at` DESC.
    fn list_summaries(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<SessionSummary>, RepositoryError>> + Send;

    /// Find-or-create the session, append `messages` in order, and set
    /// `updated_at`.
    fn append_messages(
        &self,
        session_id: &str,
        messages: &[ChatMessage],
        updated_at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a session and its messages. Returns whether it existed.
    fn delete_session(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Delete every session. Returns how many were removed.
    fn delete_all(
        &self,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
