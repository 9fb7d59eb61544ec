//! Storage backends for session blobs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use database::{session, Database, DatabaseError, SessionRecord, ValidationError};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

/// Errors returned by a session store.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    /// The backing store could not be reached or the query failed.
    #[error("session store unavailable: {0}")]
    Unavailable(String),

    /// The client id was rejected before reaching the store.
    #[error("invalid client id: {0}")]
    InvalidClientId(#[from] ValidationError),
}

impl SessionStoreError {
    /// Whether the operation may succeed if retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionStoreError::Unavailable(_))
    }
}

impl From<DatabaseError> for SessionStoreError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Invalid(e) => SessionStoreError::InvalidClientId(e),
            other => SessionStoreError::Unavailable(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionStoreError>;

/// Key-value persistence of session blobs keyed by client id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the session; `Ok(None)` only when no session is stored.
    async fn load(&self, client_id: &str) -> Result<Option<SessionRecord>>;

    /// Create or overwrite the session.
    async fn save(&self, client_id: &str, blob: &[u8]) -> Result<()>;

    /// Delete the session. Removing a missing session succeeds.
    async fn remove(&self, client_id: &str) -> Result<()>;

    /// Whether a session is stored.
    async fn exists(&self, client_id: &str) -> Result<bool>;
}

/// Sessions kept in the `whatsapp_sessions` table.
#[derive(Debug, Clone)]
pub struct DatabaseSessionStore {
    db: Database,
}

impl DatabaseSessionStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for DatabaseSessionStore {
    async fn load(&self, client_id: &str) -> Result<Option<SessionRecord>> {
        Ok(session::get_session(self.db.pool(), client_id).await?)
    }

    async fn save(&self, client_id: &str, blob: &[u8]) -> Result<()> {
        session::upsert_session(self.db.pool(), client_id, blob).await?;
        debug!(client_id, bytes = blob.len(), "Session saved");
        Ok(())
    }

    async fn remove(&self, client_id: &str) -> Result<()> {
        let removed = session::delete_session(self.db.pool(), client_id).await?;
        debug!(client_id, removed, "Session removed");
        Ok(())
    }

    async fn exists(&self, client_id: &str) -> Result<bool> {
        Ok(session::session_exists(self.db.pool(), client_id).await?)
    }
}

/// Sessions kept in process memory, for tests and throwaway runs.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, client_id: &str) -> Result<Option<SessionRecord>> {
        Ok(self.sessions.read().await.get(client_id).cloned())
    }

    async fn save(&self, client_id: &str, blob: &[u8]) -> Result<()> {
        let record = SessionRecord {
            client_id: client_id.to_string(),
            session_data: blob.to_vec(),
            updated_at: Utc::now(),
        };
        self.sessions
            .write()
            .await
            .insert(client_id.to_string(), record);
        Ok(())
    }

    async fn remove(&self, client_id: &str) -> Result<()> {
        self.sessions.write().await.remove(client_id);
        Ok(())
    }

    async fn exists(&self, client_id: &str) -> Result<bool> {
        Ok(self.sessions.read().await.contains_key(client_id))
    }
}
