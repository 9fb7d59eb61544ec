//! WebhookBrain implementation.

use brain_core::{async_trait, format_transcript, Brain, BrainError, InboundMessage, OutboundMessage};
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::WebhookBrainConfig;
use crate::types::{parse_reply, WebhookRequest};

/// A brain that posts each message to a webhook and relays its reply.
pub struct WebhookBrain {
    client: Client,
    config: WebhookBrainConfig,
}

impl WebhookBrain {
    /// Create a new WebhookBrain.
    pub fn new(config: WebhookBrainConfig) -> Result<Self, BrainError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                BrainError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, config })
    }

    /// Create a WebhookBrain from environment variables.
    pub fn from_env() -> Result<Self, BrainError> {
        Self::new(WebhookBrainConfig::from_env()?)
    }

    pub fn config(&self) -> &WebhookBrainConfig {
        &self.config
    }

    fn build_request(message: &InboundMessage) -> WebhookRequest {
        WebhookRequest {
            message: message.text.clone(),
            client_number: message.sender.clone(),
            conversation_history: format_transcript(&message.history),
        }
    }
}

#[async_trait]
impl Brain for WebhookBrain {
    async fn process(&self, message: InboundMessage) -> Result<OutboundMessage, BrainError> {
        let request = Self::build_request(&message);
        debug!("Posting message from {} to webhook", request.client_number);

        let response = self
            .client
            .post(&self.config.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BrainError::Timeout
                } else {
                    BrainError::Network(format!("Failed to reach webhook: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BrainError::Network(format!("Failed to read webhook body: {}", e)))?;

        if !status.is_success() {
            return Err(BrainError::ProcessingFailed(format!(
                "webhook returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        let reply = parse_reply(&body).ok_or_else(|| {
            warn!("Webhook answered without a reply");
            BrainError::InvalidResponse("webhook response has no reply".to_string())
        })?;

        Ok(OutboundMessage::reply_to(&message, reply))
    }

    fn name(&self) -> &str {
        "WebhookBrain"
    }
}
