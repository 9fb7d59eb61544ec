//! Core trait and types for reply backends.
//!
//! This crate provides the shared interface for every backend the relay can
//! forward customer messages to. It defines:
//!
//! - [`Brain`] - The trait all backends implement (webhook, LLM, echo)
//! - [`InboundMessage`] / [`OutboundMessage`] - Message types for input/output
//! - [`HistoryMessage`] - Recent conversation passed along with each message
//! - [`BrainError`] - Error types for brain operations
//!
//! # Example
//!
//! ```rust
//! use brain_core::{Brain, BrainError, InboundMessage, OutboundMessage};
//! use async_trait::async_trait;
//!
//! struct MyBrain;
//!
//! #[async_trait]
//! impl Brain for MyBrain {
//!     async fn process(&self, message: InboundMessage) -> Result<OutboundMessage, BrainError> {
//!         Ok(OutboundMessage::reply_to(&message, "¡Hola!"))
//!     }
//!
//!     fn name(&self) -> &str {
//!         "MyBrain"
//!     }
//! }
//! ```

mod error;
mod history;
mod message;
mod prompt;
mod trait_def;

pub use error::BrainError;
pub use history::{format_transcript, HistoryMessage};
pub use message::{InboundMessage, OutboundMessage};
pub use prompt::{hash_prompt, DEFAULT_SYSTEM_PROMPT};
pub use trait_def::Brain;

// Re-export async_trait for convenience
pub use async_trait::async_trait;
