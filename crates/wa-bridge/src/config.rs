//! Configuration types for the bridge client.

use std::env;

use crate::error::BridgeError;

/// Configuration for connecting to the bridge daemon.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Base URL of the bridge HTTP server (e.g., "http://localhost:8080").
    pub base_url: String,
    /// Session name for bridges hosting several WhatsApp sessions.
    /// If None, the bridge's default session is used.
    pub session: Option<String>,
}

impl BridgeConfig {
    /// Create a new configuration with the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: None,
        }
    }

    /// Create configuration bound to a named bridge session.
    pub fn with_session(base_url: impl Into<String>, session: impl Into<String>) -> Self {
        Self {
            session: Some(session.into()),
            ..Self::new(base_url)
        }
    }

    /// Read `BRIDGE_URL` (required) and `BRIDGE_SESSION` (optional).
    pub fn from_env() -> Result<Self, BridgeError> {
        let base_url = env::var("BRIDGE_URL")
            .map_err(|_| BridgeError::Config("BRIDGE_URL not set".to_string()))?;

        Ok(match env::var("BRIDGE_SESSION") {
            Ok(session) if !session.is_empty() => Self::with_session(base_url, session),
            _ => Self::new(base_url),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        match &self.session {
            Some(session) => format!(
                "{}/api/v1/{}?session={}",
                self.base_url,
                path,
                urlencoding::encode(session)
            ),
            None => format!("{}/api/v1/{}", self.base_url, path),
        }
    }

    /// Health check endpoint.
    pub fn check_url(&self) -> String {
        format!("{}/api/v1/check", self.base_url)
    }

    /// Own-account endpoint.
    pub fn me_url(&self) -> String {
        self.endpoint("me")
    }

    pub fn send_url(&self) -> String {
        self.endpoint("send")
    }

    pub fn send_media_url(&self) -> String {
        self.endpoint("send-media")
    }

    /// Session restore endpoint.
    pub fn session_url(&self) -> String {
        self.endpoint("session")
    }

    /// Reconnect with a fresh login QR.
    pub fn restart_url(&self) -> String {
        self.endpoint("restart")
    }

    /// SSE events endpoint.
    pub fn events_url(&self) -> String {
        self.endpoint("events")
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new("http://localhost:8080")
    }
}
