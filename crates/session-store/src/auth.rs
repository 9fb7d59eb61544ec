//! Auth strategy bridging the connection lifecycle to a [`SessionStore`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use database::validation::validate_client_id;
use database::ValidationError;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::state::AuthState;
use crate::store::{SessionStore, SessionStoreError};

/// How often the latest credentials are re-saved while connected.
pub const BACKUP_SYNC_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Errors raised by the auth strategy.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid auth transition from {from} to {to}")]
    InvalidTransition { from: AuthState, to: AuthState },

    #[error(transparent)]
    Store(#[from] SessionStoreError),

    #[error("invalid client id: {0}")]
    InvalidClientId(#[from] ValidationError),
}

/// Lifecycle hooks invoked by the messaging client.
#[async_trait]
pub trait AuthStrategy: Send + Sync {
    /// Called once before the client connects.
    async fn before_init(&self) -> Result<(), AuthError>;

    /// Stored credentials to resume with, if any. Called once at startup.
    async fn get_auth(&self) -> Result<Option<Vec<u8>>, AuthError>;

    /// Credentials were issued or refreshed; persist them before returning.
    async fn on_authenticated(&self, blob: Vec<u8>) -> Result<(), AuthError>;

    /// The device was logged out; forget the session.
    async fn on_logout(&self) -> Result<(), AuthError>;
}

/// Auth strategy that persists credentials in a [`SessionStore`].
pub struct RemoteAuth<S: SessionStore> {
    client_id: String,
    store: Arc<S>,
    state: RwLock<AuthState>,
    latest: Mutex<Option<Vec<u8>>>,
}

impl<S: SessionStore + 'static> RemoteAuth<S> {
    /// Create the strategy for a client id.
    pub fn new(client_id: impl Into<String>, store: Arc<S>) -> Result<Self, AuthError> {
        let client_id = client_id.into();
        validate_client_id(&client_id)?;

        Ok(Self {
            client_id,
            store,
            state: RwLock::new(AuthState::Unauthenticated),
            latest: Mutex::new(None),
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> AuthState {
        *self.state.read().await
    }

    /// Move to `next`, rejecting transitions the lifecycle does not allow.
    pub async fn transition(&self, next: AuthState) -> Result<AuthState, AuthError> {
        let mut state = self.state.write().await;
        let from = *state;

        if !from.can_transition_to(next) {
            return Err(AuthError::InvalidTransition { from, to: next });
        }

        if from != next {
            info!(client_id = %self.client_id, "Auth state {} -> {}", from, next);
        }
        *state = next;
        Ok(from)
    }

    /// The bridge is connecting or showed a QR code.
    pub async fn on_connecting(&self) -> Result<(), AuthError> {
        self.transition(AuthState::Authenticating).await?;
        Ok(())
    }

    /// The bridge reports an open connection.
    ///
    /// Walks through the intermediate states when the bridge resumed from
    /// stored credentials without issuing new ones.
    pub async fn on_connection_open(&self) -> Result<(), AuthError> {
        loop {
            let next = match self.state().await {
                AuthState::Unauthenticated | AuthState::Disconnected => AuthState::Authenticating,
                AuthState::Authenticating => AuthState::Authenticated,
                AuthState::Authenticated => AuthState::Ready,
                AuthState::Ready => return Ok(()),
                from @ AuthState::LoggedOut => {
                    return Err(AuthError::InvalidTransition {
                        from,
                        to: AuthState::Ready,
                    })
                }
            };
            self.transition(next).await?;
        }
    }

    /// The transport dropped without a logout.
    pub async fn on_disconnected(&self) -> Result<(), AuthError> {
        if self.state().await == AuthState::Disconnected {
            return Ok(());
        }
        self.transition(AuthState::Disconnected).await?;
        Ok(())
    }

    /// Leave `LoggedOut` so a fresh QR login can start.
    pub async fn restart(&self) {
        let mut state = self.state.write().await;
        info!(client_id = %self.client_id, "Auth state {} -> {} (restart)", *state, AuthState::Unauthenticated);
        *state = AuthState::Unauthenticated;
    }

    /// Re-save the latest credentials every `interval` while `Ready`.
    pub fn spawn_backup_sync(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let auth = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if let Err(e) = auth.backup_once().await {
                    error!(client_id = %auth.client_id, "Session backup failed: {}", e);
                }
            }
        })
    }

    /// Save the latest credentials if connected. Returns whether a save happened.
    pub async fn backup_once(&self) -> Result<bool, AuthError> {
        if self.state().await != AuthState::Ready {
            return Ok(false);
        }

        let latest = self.latest.lock().await.clone();
        match latest {
            Some(blob) => {
                self.store.save(&self.client_id, &blob).await?;
                debug!(client_id = %self.client_id, "Session backup saved");
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl<S: SessionStore + 'static> AuthStrategy for RemoteAuth<S> {
    async fn before_init(&self) -> Result<(), AuthError> {
        let exists = self.store.exists(&self.client_id).await?;
        if exists {
            info!(client_id = %self.client_id, "Stored session found");
        } else {
            info!(client_id = %self.client_id, "No stored session, a QR login will be needed");
        }
        Ok(())
    }

    async fn get_auth(&self) -> Result<Option<Vec<u8>>, AuthError> {
        let record = self.store.load(&self.client_id).await?;
        let blob = record.map(|r| r.session_data);

        if let Some(ref blob) = blob {
            *self.latest.lock().await = Some(blob.clone());
        }
        Ok(blob)
    }

    async fn on_authenticated(&self, blob: Vec<u8>) -> Result<(), AuthError> {
        self.store.save(&self.client_id, &blob).await?;
        *self.latest.lock().await = Some(blob);

        // Credential refreshes also arrive while already connected
        if self.state().await == AuthState::Authenticating {
            self.transition(AuthState::Authenticated).await?;
        }
        Ok(())
    }

    async fn on_logout(&self) -> Result<(), AuthError> {
        self.store.remove(&self.client_id).await?;
        *self.latest.lock().await = None;

        if self.state().await == AuthState::LoggedOut {
            warn!(client_id = %self.client_id, "Logout received while already logged out");
            return Ok(());
        }
        self.transition(AuthState::LoggedOut).await?;
        Ok(())
    }
}
