//! Configuration for LlmBrain.

use brain_core::{BrainError, DEFAULT_SYSTEM_PROMPT};
use std::env;
use std::path::Path;

/// Default system prompt file name.
pub const DEFAULT_PROMPT_FILE: &str = "SYSTEM_PROMPT.md";

/// Configuration for LlmBrain.
#[derive(Debug, Clone)]
pub struct LlmBrainConfig {
    /// Base URL of the OpenAI-compatible API.
    pub api_url: String,

    /// Bearer key for authentication.
    pub api_key: String,

    pub model: String,

    /// System prompt sent before the conversation.
    pub system_prompt: String,

    /// Maximum tokens for response.
    pub max_tokens: Option<u32>,

    /// Temperature for generation (0.0 - 2.0).
    pub temperature: Option<f32>,
}

impl Default for LlmBrainConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tokens: Some(1024),
            temperature: Some(0.7),
        }
    }
}

impl LlmBrainConfig {
    /// Create configuration from environment variables.
    ///
    /// Required:
    /// - `LLM_API_KEY`
    ///
    /// Optional:
    /// - `LLM_API_URL` (default: https://api.openai.com)
    /// - `LLM_MODEL` (default: gpt-4o-mini)
    /// - `LLM_SYSTEM_PROMPT` - overrides the prompt file
    /// - `LLM_PROMPT_FILE` (default: SYSTEM_PROMPT.md)
    /// - `LLM_MAX_TOKENS` (default: 1024)
    /// - `LLM_TEMPERATURE` (default: 0.7)
    ///
    /// Without a prompt variable or file the built-in sales prompt is used.
    pub fn from_env() -> Result<Self, BrainError> {
        let api_key = env::var("LLM_API_KEY")
            .map_err(|_| BrainError::Configuration("LLM_API_KEY not set".to_string()))?;

        let defaults = Self::default();

        let api_url = env::var("LLM_API_URL").unwrap_or(defaults.api_url);
        let model = env::var("LLM_MODEL").unwrap_or(defaults.model);

        let system_prompt = match env::var("LLM_SYSTEM_PROMPT") {
            Ok(prompt) => prompt,
            Err(_) => {
                let prompt_file = env::var("LLM_PROMPT_FILE")
                    .unwrap_or_else(|_| DEFAULT_PROMPT_FILE.to_string());
                load_prompt_file(&prompt_file).unwrap_or(defaults.system_prompt)
            }
        };

        let max_tokens = env::var("LLM_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(defaults.max_tokens);

        let temperature = env::var("LLM_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(defaults.temperature);

        Ok(Self {
            api_url,
            api_key,
            model,
            system_prompt,
            max_tokens,
            temperature,
        })
    }

    /// Create a new config builder.
    pub fn builder() -> LlmBrainConfigBuilder {
        LlmBrainConfigBuilder::default()
    }
}

/// Builder for LlmBrainConfig.
#[derive(Debug, Default)]
pub struct LlmBrainConfigBuilder {
    config: LlmBrainConfig,
}

impl LlmBrainConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.config.max_tokens = Some(tokens);
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.temperature = Some(temp);
        self
    }

    /// Load the system prompt from a file, keeping the current one if the
    /// file is missing or empty.
    pub fn load_prompt_file(mut self, path: impl AsRef<Path>) -> Self {
        if let Some(prompt) = load_prompt_file(path) {
            self.config.system_prompt = prompt;
        }
        self
    }

    pub fn build(self) -> LlmBrainConfig {
        self.config
    }
}

fn load_prompt_file(path: impl AsRef<Path>) -> Option<String> {
    let content = std::fs::read_to_string(path.as_ref()).ok()?;
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LlmBrainConfig::default();

        assert_eq!(config.api_url, "https://api.openai.com");
        assert!(config.api_key.is_empty());
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(config.max_tokens, Some(1024));
    }

    #[test]
    fn test_builder_all_options() {
        let config = LlmBrainConfig::builder()
            .api_key("my-key")
            .api_url("http://localhost:11434")
            .model("llama3")
            .system_prompt("Eres un asistente")
            .max_tokens(256)
            .temperature(0.2)
            .build();

        assert_eq!(config.api_key, "my-key");
        assert_eq!(config.api_url, "http://localhost:11434");
        assert_eq!(config.model, "llama3");
        assert_eq!(config.system_prompt, "Eres un asistente");
        assert_eq!(config.max_tokens, Some(256));
        assert_eq!(config.temperature, Some(0.2));
    }

    #[test]
    fn test_builder_missing_prompt_file_keeps_prompt() {
        let config = LlmBrainConfig::builder()
            .system_prompt("actual")
            .load_prompt_file("/nonexistent/SYSTEM_PROMPT.md")
            .build();
        assert_eq!(config.system_prompt, "actual");
    }

    // Env vars are process-global, so all scenarios share one test.
    #[test]
    fn test_from_env_scenarios() {
        use std::sync::Mutex;
        static ENV_LOCK: Mutex<()> = Mutex::new(());
        let _guard = ENV_LOCK.lock().unwrap();

        fn clear_all_llm_vars() {
            for key in [
                "LLM_API_KEY",
                "LLM_API_URL",
                "LLM_MODEL",
                "LLM_SYSTEM_PROMPT",
                "LLM_PROMPT_FILE",
                "LLM_MAX_TOKENS",
                "LLM_TEMPERATURE",
            ] {
                std::env::remove_var(key);
            }
        }

        clear_all_llm_vars();
        match LlmBrainConfig::from_env() {
            Err(BrainError::Configuration(msg)) => assert!(msg.contains("LLM_API_KEY")),
            other => panic!("Expected Configuration error, got {:?}", other),
        }

        clear_all_llm_vars();
        std::env::set_var("LLM_API_KEY", "env-key");
        std::env::set_var("LLM_PROMPT_FILE", "/nonexistent/prompt.md");
        let config = LlmBrainConfig::from_env().unwrap();
        assert_eq!(config.api_key, "env-key");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.system_prompt, DEFAULT_SYSTEM_PROMPT);

        clear_all_llm_vars();
        std::env::set_var("LLM_API_KEY", "env-key");
        std::env::set_var("LLM_API_URL", "http://llm.local");
        std::env::set_var("LLM_MODEL", "mistral");
        std::env::set_var("LLM_SYSTEM_PROMPT", "Prompt de prueba");
        std::env::set_var("LLM_MAX_TOKENS", "512");
        std::env::set_var("LLM_TEMPERATURE", "0.1");
        let config = LlmBrainConfig::from_env().unwrap();
        assert_eq!(config.api_url, "http://llm.local");
        assert_eq!(config.model, "mistral");
        assert_eq!(config.system_prompt, "Prompt de prueba");
        assert_eq!(config.max_tokens, Some(512));
        assert_eq!(config.temperature, Some(0.1));

        clear_all_llm_vars();
    }
}
