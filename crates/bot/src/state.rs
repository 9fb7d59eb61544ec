//! Application state shared across handlers.

use std::sync::Arc;

use message_listener::Pipeline;
use session_store::{DatabaseSessionStore, RemoteAuth};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Delivery pipeline, also used to send on behalf of API callers.
    pub pipeline: Arc<Pipeline>,
    /// Bridge session lifecycle.
    pub auth: Arc<RemoteAuth<DatabaseSessionStore>>,
}

impl AppState {
    /// Create new application state.
    pub fn new(pipeline: Arc<Pipeline>, auth: Arc<RemoteAuth<DatabaseSessionStore>>) -> Self {
        Self { pipeline, auth }
    }
}
