//! SQLite session store implementation.
//!
//! Implements `SessionStore` from `parley-core` using sqlx with split
//! read/write pools: raw queries, private Row structs, reads on the reader
//! pool and every mutation on the single-connection writer.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use parley_core::chat::store::SessionStore;
use parley_types::chat::{ChatMessage, ChatRole, ChatSession, SessionSummary};
use parley_types::error::RepositoryError;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `SessionStore`.
#[derive(Clone)]
pub struct SqliteSessionStore {
    pool: DatabasePool,
}

impl SqliteSessionStore {
    /// Create a new store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    async fn load_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, session_id, role, content, created_at FROM chat_messages
             WHERE session_id = ? ORDER BY seq ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(map_sqlx_error)?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let msg_row =
                MessageRow::from_row(row).map_err(map_sqlx_error)?;
            messages.push(msg_row.into_message()?);
        }
        Ok(messages)
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct SessionRow {
    session_id: String,
    created_at: String,
    updated_at: String,
}

impl SessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            session_id: row.try_get("session_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_session(self, messages: Vec<ChatMessage>) -> Result<ChatSession, RepositoryError> {
        Ok(ChatSession {
            session_id: self.session_id,
            messages,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct MessageRow {
    id: String,
    session_id: String,
    role: String,
    content: String,
    created_at: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            session_id: row.try_get("session_id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<ChatMessage, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid message id: {e}")))?;
        let role: ChatRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(ChatMessage {
            id,
            role,
            content: self.content,
            timestamp: parse_datetime(&self.created_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Pool and I/O failures mean the database is unreachable; anything else is
/// a failed statement.
fn map_sqlx_error(err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            tracing::error!(error = %err, "SQLite connection unavailable");
            RepositoryError::Connection
        }
        other => RepositoryError::Query(other.to_string()),
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Fixed-width RFC 3339 so text ordering matches time ordering.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

// ---------------------------------------------------------------------------
// SessionStore implementation
// ---------------------------------------------------------------------------

impl SessionStore for SqliteSessionStore {
    async fn find_session(&self, session_id: &str) -> Result<Option<ChatSession>, RepositoryError> {
        let row = sqlx::query(
            "SELECT session_id, created_at, updated_at FROM chat_sessions WHERE session_id = ?",
        )
        .bind(session_id)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let session_row =
            SessionRow::from_row(&row).map_err(map_sqlx_error)?;
        let messages = self.load_messages(session_id).await?;
        Ok(Some(session_row.into_session(messages)?))
    }

    async fn list_sessions(&self) -> Result<Vec<ChatSession>, RepositoryError> {
        let session_rows = sqlx::query(
            "SELECT session_id, created_at, updated_at FROM chat_sessions ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool.reader)
        .await
        .map_err(map_sqlx_error)?;

        let message_rows = sqlx::query(
            "SELECT id, session_id, role, content, created_at FROM chat_messages
             ORDER BY session_id, seq ASC",
        )
        .fetch_all(&self.pool.reader)
        .await
        .map_err(map_sqlx_error)?;

        let mut by_session: HashMap<String, Vec<ChatMessage>> = HashMap::new();
        for row in &message_rows {
            let msg_row =
                MessageRow::from_row(row).map_err(map_sqlx_error)?;
            let session_id = msg_row.session_id.clone();
            by_session
                .entry(session_id)
                .or_default()
                .push(msg_row.into_message()?);
        }

        let mut sessions = Vec::with_capacity(session_rows.len());
        for row in &session_rows {
            let session_row =
                SessionRow::from_row(row).map_err(map_sqlx_error)?;
            let messages = by_session
                .remove(&session_row.session_id)
                .unwrap_or_default();
            sessions.push(session_row.into_session(messages)?);
        }
        Ok(sessions)
    }

    async fn list_summaries(&self) -> Result<Vec<SessionSummary>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT s.session_id, s.created_at, s.updated_at, COUNT(m.id) AS message_count
               FROM chat_sessions s
               LEFT JOIN chat_messages m ON m.session_id = s.session_id
               GROUP BY s.session_id
               ORDER BY s.updated_at DESC"#,
        )
        .fetch_all(&self.pool.reader)
        .await
        .map_err(map_sqlx_error)?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in &rows {
            let session_row =
                SessionRow::from_row(row).map_err(map_sqlx_error)?;
            let count: i64 = row
                .try_get("message_count")
                .map_err(map_sqlx_error)?;
            summaries.push(SessionSummary {
                session_id: session_row.session_id,
                message_count: count as u32,
                created_at: parse_datetime(&session_row.created_at)?,
                updated_at: parse_datetime(&session_row.updated_at)?,
            });
        }
        Ok(summaries)
    }

    async fn append_messages(
        &self,
        session_id: &str,
        messages: &[ChatMessage],
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let created_at = messages.first().map(|m| m.timestamp).unwrap_or(updated_at);

        // Upsert the session and append after its current tail in one transaction
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(map_sqlx_error)?;

        sqlx::query(
            r#"INSERT INTO chat_sessions (session_id, created_at, updated_at)
               VALUES (?, ?, ?)
               ON CONFLICT(session_id) DO UPDATE SET updated_at = excluded.updated_at"#,
        )
        .bind(session_id)
        .bind(format_datetime(&created_at))
        .bind(format_datetime(&updated_at))
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let row = sqlx::query(
            "SELECT COALESCE(MAX(seq), 0) AS last_seq FROM chat_messages WHERE session_id = ?",
        )
        .bind(session_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;
        let last_seq: i64 = row
            .try_get("last_seq")
            .map_err(map_sqlx_error)?;

        for (offset, message) in messages.iter().enumerate() {
            sqlx::query(
                r#"INSERT INTO chat_messages (id, session_id, seq, role, content, created_at)
                   VALUES (?, ?, ?, ?, ?, ?)"#,
            )
            .bind(message.id.to_string())
            .bind(session_id)
            .bind(last_seq + 1 + offset as i64)
            .bind(message.role.to_string())
            .bind(&message.content)
            .bind(format_datetime(&message.timestamp))
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e {
                    if db_err.message().contains("UNIQUE") {
                        return RepositoryError::Conflict(format!(
                            "message {} already stored",
                            message.id
                        ));
                    }
                }
                map_sqlx_error(e)
            })?;
        }

        tx.commit()
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn delete_session(&self, session_id: &str) -> Result<bool, RepositoryError> {
        // Messages go with the session via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM chat_sessions WHERE session_id = ?")
            .bind(session_id)
            .execute(&self.pool.writer)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM chat_sessions")
            .execute(&self.pool.writer)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::default_database_url;
    use std::sync::Arc;

    async fn test_store() -> SqliteSessionStore {
        let dir = tempfile::tempdir().unwrap();
        let url = default_database_url(dir.path());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        SqliteSessionStore::new(DatabasePool::new(&url).await.unwrap())
    }

    fn exchange(question: &str) -> [ChatMessage; 2] {
        [
            ChatMessage::user(question),
            ChatMessage::assistant(format!("re: {question}")),
        ]
    }

    #[tokio::test]
    async fn test_find_missing_session() {
        let store = test_store().await;
        assert!(store.find_session("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_append_creates_session() {
        let store = test_store().await;
        let turns = exchange("hello");
        let now = Utc::now();

        store.append_messages("s1", &turns, now).await.unwrap();

        let session = store.find_session("s1").await.unwrap().unwrap();
        assert_eq!(session.session_id, "s1");
        assert_eq!(session.messages, turns.to_vec());
        assert_eq!(session.updated_at, now);
        assert_eq!(session.created_at, turns[0].timestamp);
    }

    #[tokio::test]
    async fn test_append_keeps_submission_order_and_refreshes_updated_at() {
        let store = test_store().await;
        let first = exchange("one");
        let second = exchange("two");
        let t1 = Utc::now();
        store.append_messages("s1", &first, t1).await.unwrap();
        let t2 = t1 + chrono::Duration::seconds(1);
        store.append_messages("s1", &second, t2).await.unwrap();

        let session = store.find_session("s1").await.unwrap().unwrap();
        let contents: Vec<&str> = session.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "re: one", "two", "re: two"]);
        assert_eq!(session.updated_at, t2);
        assert_eq!(session.created_at, first[0].timestamp);
    }

    #[tokio::test]
    async fn test_duplicate_message_is_conflict_and_rolls_back() {
        let store = test_store().await;
        let turns = exchange("hello");
        store.append_messages("s1", &turns, Utc::now()).await.unwrap();

        let fresh = ChatMessage::user("not stored");
        let err = store
            .append_messages("s1", &[fresh, turns[0].clone()], Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));

        let session = store.find_session("s1").await.unwrap().unwrap();
        assert_eq!(session.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_all_kept() {
        let store = Arc::new(test_store().await);

        let mut handles = Vec::new();
        for i in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let turns = exchange(&format!("q{i}"));
                store.append_messages("shared", &turns, Utc::now()).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let session = store.find_session("shared").await.unwrap().unwrap();
        assert_eq!(session.messages.len(), 20);
        // Each exchange stays contiguous: user turn immediately followed by its reply
        for pair in session.messages.chunks(2) {
            assert_eq!(pair[0].role, ChatRole::User);
            assert_eq!(pair[1].content, format!("re: {}", pair[0].content));
        }
    }

    #[tokio::test]
    async fn test_list_sessions_with_messages() {
        let store = test_store().await;
        store.append_messages("a", &exchange("from a"), Utc::now()).await.unwrap();
        store.append_messages("b", &exchange("from b"), Utc::now()).await.unwrap();

        let sessions = store.list_sessions().await.unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].session_id, "a");
        assert_eq!(sessions[0].messages[0].content, "from a");
        assert_eq!(sessions[1].messages.len(), 2);
    }

    #[tokio::test]
    async fn test_list_summaries_most_recent_first() {
        let store = test_store().await;
        let t = Utc::now();
        store.append_messages("old", &exchange("1"), t).await.unwrap();
        store
            .append_messages("new", &exchange("2"), t + chrono::Duration::seconds(5))
            .await
            .unwrap();
        store
            .append_messages("new", &exchange("3"), t + chrono::Duration::seconds(6))
            .await
            .unwrap();

        let summaries = store.list_summaries().await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].session_id, "new");
        assert_eq!(summaries[0].message_count, 4);
        assert_eq!(summaries[1].session_id, "old");
        assert_eq!(summaries[1].message_count, 2);
    }

    #[tokio::test]
    async fn test_delete_session_cascades() {
        let store = test_store().await;
        store.append_messages("s1", &exchange("x"), Utc::now()).await.unwrap();
        store.append_messages("s2", &exchange("y"), Utc::now()).await.unwrap();

        assert!(store.delete_session("s1").await.unwrap());
        assert!(store.find_session("s1").await.unwrap().is_none());
        assert!(!store.delete_session("s1").await.unwrap());

        let (orphans,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM chat_messages WHERE session_id = 's1'")
                .fetch_one(&store.pool().reader)
                .await
                .unwrap();
        assert_eq!(orphans, 0);
        assert!(store.find_session("s2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_all() {
        let store = test_store().await;
        store.append_messages("s1", &exchange("x"), Utc::now()).await.unwrap();
        store.append_messages("s2", &exchange("y"), Utc::now()).await.unwrap();

        assert_eq!(store.delete_all().await.unwrap(), 2);
        assert!(store.list_sessions().await.unwrap().is_empty());
        assert_eq!(store.delete_all().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_closed_pool_reports_connection_error() {
        let store = test_store().await;
        store.pool().close().await;

        let read = store.find_session("s1").await.unwrap_err();
        assert!(matches!(read, RepositoryError::Connection));

        let write = store
            .append_messages("s1", &exchange("x"), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(write, RepositoryError::Connection));
    }
}
