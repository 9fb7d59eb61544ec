//! Mock brain implementations for the relay pipeline.
//!
//! This crate provides implementations of the `Brain` trait that need no
//! external backend:
//! - `EchoBrain` - Echoes messages back (the `echo` backend)
//! - `ScriptedBrain` - Returns canned replies and records every call
//! - `FailingBrain` - Always fails, for exercising fallback replies
//! - `DelayedBrain` - Wraps another brain with artificial delay
//!
//! # Example
//!
//! ```rust
//! use mock_brain::{Brain, EchoBrain, InboundMessage};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mock_brain::BrainError> {
//!     let brain = EchoBrain::new();
//!
//!     let message = InboundMessage::direct("5215512345678", "Hola", 1234567890);
//!
//!     let response = brain.process(message).await?;
//!     println!("Response: {}", response.text);
//!     Ok(())
//! }
//! ```

mod delayed;
mod echo;
mod scripted;

// Re-export brain-core types for convenience
pub use brain_core::{async_trait, Brain, BrainError, InboundMessage, OutboundMessage};

pub use delayed::DelayedBrain;
pub use echo::EchoBrain;
pub use scripted::{FailingBrain, ScriptedBrain};
