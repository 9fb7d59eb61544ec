//! Session persistence for the WhatsApp bridge.
//!
//! - [`SessionStore`] - key-value storage of the opaque credential blob
//! - [`RemoteAuth`] - lifecycle hooks that keep the store in sync with the
//!   bridge connection, plus the [`AuthState`] machine
//!
//! ```rust
//! use std::sync::Arc;
//! use session_store::{AuthStrategy, MemorySessionStore, RemoteAuth};
//!
//! # async fn example() -> Result<(), session_store::AuthError> {
//! let auth = RemoteAuth::new("tienda-centro", Arc::new(MemorySessionStore::new()))?;
//! auth.before_init().await?;
//! let restored = auth.get_auth().await?;
//! assert!(restored.is_none());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod state;
pub mod store;

pub use auth::{AuthError, AuthStrategy, RemoteAuth, BACKUP_SYNC_INTERVAL};
pub use state::AuthState;
pub use store::{DatabaseSessionStore, MemorySessionStore, SessionStore, SessionStoreError};
