//! Runtime store selection.
//!
//! `SessionBackend` wraps whichever store the configuration picked so the
//! service stays generic over a single concrete `SessionStore`.

use chrono::{DateTime, Utc};
use parley_core::chat::store::SessionStore;
use parley_types::chat::{ChatMessage, ChatSession, SessionSummary};
use parley_types::config::{StoreBackend, StoreConfig};
use parley_types::error::RepositoryError;
use std::path::Path;
use tracing::info;

use crate::memory::MemorySessionStore;
use crate::sqlite::pool::{DatabasePool, default_database_url};
use crate::sqlite::session::SqliteSessionStore;

/// The configured session store.
#[derive(Clone)]
pub enum SessionBackend {
    Sqlite(SqliteSessionStore),
    Memory(MemorySessionStore),
}

impl SessionBackend {
    /// Open the store described by `config`.
    ///
    /// SQLite defaults to `parley.db` under `data_dir`.
    pub async fn open(config: &StoreConfig, data_dir: &Path) -> anyhow::Result<Self> {
        match config.backend {
            StoreBackend::Sqlite => {
                let url = config
                    .database_url
                    .clone()
                    .unwrap_or_else(|| default_database_url(data_dir));
                std::fs::create_dir_all(data_dir)?;
                let pool = DatabasePool::new(&url).await?;
                info!(database_url = %url, "Opened SQLite session store");
                Ok(Self::Sqlite(SqliteSessionStore::new(pool)))
            }
            StoreBackend::Memory => {
                info!("Using in-memory session store");
                Ok(Self::Memory(MemorySessionStore::new()))
            }
        }
    }

    /// Release pooled connections. No-op for the in-memory store.
    pub async fn close(&self) {
        if let Self::Sqlite(store) = self {
            store.pool().close().await;
        }
    }
}

impl SessionStore for SessionBackend {
    async fn find_session(&self, session_id: &str) -> Result<Option<ChatSession>, RepositoryError> {
        match self {
            Self::Sqlite(s) => s.find_session(session_id).await,
            Self::Memory(s) => s.find_session(session_id).await,
        }
    }

    async fn list_sessions(&self) -> Result<Vec<ChatSession>, RepositoryError> {
        match self {
            Self::Sqlite(s) => s.list_sessions().await,
            Self::Memory(s) => s.list_sessions().await,
        }
    }

    async fn list_summaries(&self) -> Result<Vec<SessionSummary>, RepositoryError> {
        match self {
            Self::Sqlite(s) => s.list_summaries().await,
            Self::Memory(s) => s.list_summaries().await,
        }
    }

    async fn append_messages(
        &self,
        session_id: &str,
        messages: &[ChatMessage],
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        match self {
            Self::Sqlite(s) => s.append_messages(session_id, messages, updated_at).await,
            Self::Memory(s) => s.append_messages(session_id, messages, updated_at).await,
        }
    }

    async fn delete_session(&self, session_id: &str) -> Result<bool, RepositoryError> {
        match self {
            Self::Sqlite(s) => s.delete_session(session_id).await,
            Self::Memory(s) => s.delete_session(session_id).await,
        }
    }

    async fn delete_all(&self) -> Result<u64, RepositoryError> {
        match self {
            Self::Sqlite(s) => s.delete_all().await,
            Self::Memory(s) => s.delete_all().await,
        }
    }
}
