//! LlmBrain implementation.

use brain_core::{async_trait, hash_prompt, Brain, BrainError, InboundMessage, OutboundMessage};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::api_types::{ApiError, ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use crate::config::LlmBrainConfig;

/// A brain that forwards each customer message, with its recent history, to
/// an OpenAI-compatible chat completions endpoint.
pub struct LlmBrain {
    client: Client,
    config: LlmBrainConfig,
    system_prompt_hash: String,
}

impl LlmBrain {
    /// Create a new LlmBrain with the given configuration.
    pub fn new(config: LlmBrainConfig) -> Result<Self, BrainError> {
        let client = Client::builder().build().map_err(|e| {
            BrainError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        let system_prompt_hash = hash_prompt(&config.system_prompt);
        info!(
            "LlmBrain initialized with model: {}, prompt fingerprint: {}",
            config.model, system_prompt_hash
        );

        Ok(Self {
            client,
            config,
            system_prompt_hash,
        })
    }

    /// Create an LlmBrain from environment variables.
    ///
    /// See [`LlmBrainConfig::from_env`].
    pub fn from_env() -> Result<Self, BrainError> {
        Self::new(LlmBrainConfig::from_env()?)
    }

    pub fn config(&self) -> &LlmBrainConfig {
        &self.config
    }

    /// SHA-256 fingerprint of the configured system prompt.
    pub fn system_prompt_hash(&self) -> &str {
        &self.system_prompt_hash
    }

    /// System prompt, then history, then the current customer text.
    fn build_messages(&self, message: &InboundMessage) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(message.history.len() + 2);
        messages.push(ChatMessage::system(self.config.system_prompt.clone()));

        for entry in &message.history {
            messages.push(ChatMessage {
                role: entry.role.clone(),
                content: entry.content.clone(),
            });
        }

        messages.push(ChatMessage::user(message.text.clone()));
        messages
    }

    async fn chat_completion(
        &self,
        messages: Vec<ChatMessage>,
    ) -> Result<ChatCompletionResponse, BrainError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.api_url.trim_end_matches('/')
        );

        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!("Sending chat completion request: {:?}", request);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| BrainError::Network(format!("Failed to send request: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ApiError>(&error_text)
                .map(|api_error| api_error.error.message)
                .unwrap_or(error_text);

            return Err(BrainError::ProcessingFailed(format!(
                "API error ({}): {}",
                status.as_u16(),
                detail
            )));
        }

        response
            .json()
            .await
            .map_err(|e| BrainError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl Brain for LlmBrain {
    async fn process(&self, message: InboundMessage) -> Result<OutboundMessage, BrainError> {
        debug!(
            "Processing message from {} with {} history entries",
            message.sender,
            message.history.len()
        );

        let messages = self.build_messages(&message);
        let completion = self.chat_completion(messages).await?;

        if let Some(usage) = &completion.usage {
            debug!(
                "Token usage - prompt: {}, completion: {}, total: {}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                warn!("Completion had no content");
                BrainError::InvalidResponse("empty completion".to_string())
            })?;

        Ok(OutboundMessage::reply_to(&message, text))
    }

    fn name(&self) -> &str {
        "LlmBrain"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brain_core::HistoryMessage;

    fn brain() -> LlmBrain {
        let config = LlmBrainConfig::builder()
            .api_key("test-key")
            .system_prompt("Eres un vendedor")
            .build();
        LlmBrain::new(config).unwrap()
    }

    #[test]
    fn test_build_messages_includes_history() {
        let brain = brain();
        let message = InboundMessage::direct("5215512345678", "Una grande", 0).with_history(vec![
            HistoryMessage::user("Quiero pizza"),
            HistoryMessage::assistant("¿De qué tamaño?"),
        ]);

        let messages = brain.build_messages(&message);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], ChatMessage::system("Eres un vendedor"));
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[2].role, "assistant");
        assert_eq!(messages[3], ChatMessage::user("Una grande"));
    }

    #[test]
    fn test_brain_name_and_hash() {
        let brain = brain();
        assert_eq!(brain.name(), "LlmBrain");
        assert_eq!(brain.system_prompt_hash(), hash_prompt("Eres un vendedor"));
    }

    #[tokio::test]
    async fn test_unreachable_api_is_network_error() {
        let config = LlmBrainConfig::builder()
            .api_key("test-key")
            .api_url("http://127.0.0.1:1")
            .build();
        let brain = LlmBrain::new(config).unwrap();

        let result = brain.process(InboundMessage::direct("555", "hola", 0)).await;
        assert!(matches!(result, Err(BrainError::Network(_))));
    }
}
