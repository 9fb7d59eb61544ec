//! Error types for the bridge client.

use thiserror::Error;

/// Errors that can occur when interacting with the bridge daemon.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The bridge answered with a non-success status.
    #[error("bridge returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Bridge health check failed.
    #[error("Health check failed")]
    HealthCheckFailed,

    /// SSE stream error.
    #[error("SSE error: {0}")]
    Sse(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Message sending failed.
    #[error("Send failed: {0}")]
    SendFailed(String),
}

impl BridgeError {
    /// Whether retrying the request later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            BridgeError::Http(e) => e.is_timeout() || e.is_connect(),
            BridgeError::Api { status, .. } => *status >= 500,
            BridgeError::HealthCheckFailed | BridgeError::Sse(_) => true,
            _ => false,
        }
    }
}
