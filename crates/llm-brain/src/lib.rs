//! LLM-backed brain using an OpenAI-compatible chat completions API.
//!
//! The conversation history loaded from the message log is sent along with
//! every request, so the brain itself keeps no per-sender state.
//!
//! ```rust,no_run
//! use llm_brain::LlmBrain;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let brain = LlmBrain::from_env()?;
//! # Ok(())
//! # }
//! ```

mod api_types;
mod brain;
mod config;

pub use brain::LlmBrain;
pub use config::{LlmBrainConfig, LlmBrainConfigBuilder};

pub use brain_core::{async_trait, Brain, BrainError, InboundMessage, OutboundMessage};
