//! The Brain trait definition.

use async_trait::async_trait;

use crate::error::BrainError;
use crate::message::{InboundMessage, OutboundMessage};

/// A backend that turns a customer message into a reply.
///
/// Implementations range from an echo bot to a workflow webhook or an LLM
/// API. The trait is object-safe and can be used as `Arc<dyn Brain>`.
#[async_trait]
pub trait Brain: Send + Sync {
    /// Process an inbound message and generate a reply.
    ///
    /// # Arguments
    ///
    /// * `message` - The customer message, with recent conversation history.
    ///
    /// # Returns
    ///
    /// An `OutboundMessage` containing the reply, or an error if the backend
    /// failed.
    async fn process(&self, message: InboundMessage) -> Result<OutboundMessage, BrainError>;

    /// Get a human-readable name for this brain implementation.
    fn name(&self) -> &str;

    /// Check if the brain is ready to process messages.
    ///
    /// Default implementation always returns true.
    async fn is_ready(&self) -> bool {
        true
    }

    /// Gracefully shut down the brain.
    ///
    /// Default implementation does nothing.
    async fn shutdown(&self) -> Result<(), BrainError> {
        Ok(())
    }
}
