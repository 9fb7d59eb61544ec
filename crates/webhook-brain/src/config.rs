//! Configuration for WebhookBrain.

use brain_core::BrainError;
use std::env;
use std::time::Duration;

/// Configuration for WebhookBrain.
#[derive(Debug, Clone)]
pub struct WebhookBrainConfig {
    /// Webhook endpoint receiving customer messages.
    pub url: String,

    /// HTTP timeout for one webhook call.
    pub timeout: Duration,
}

impl WebhookBrainConfig {
    /// Default HTTP timeout, matching the pipeline's backend timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Create a config for the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create configuration from environment variables.
    ///
    /// Required: `WEBHOOK_URL`. Optional: `BACKEND_TIMEOUT_SECS` (default 60).
    pub fn from_env() -> Result<Self, BrainError> {
        let url = env::var("WEBHOOK_URL")
            .map_err(|_| BrainError::Configuration("WEBHOOK_URL not set".to_string()))?;

        if url.trim().is_empty() {
            return Err(BrainError::Configuration("WEBHOOK_URL is empty".to_string()));
        }

        let timeout = env::var("BACKEND_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Self::DEFAULT_TIMEOUT);

        Ok(Self { url, timeout })
    }
}
