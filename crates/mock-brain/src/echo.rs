//! Echo brain implementation - echoes messages back.

use brain_core::{async_trait, Brain, BrainError, InboundMessage, OutboundMessage};

/// A simple brain that echoes messages back to the sender.
///
/// Useful for checking the bridge round trip without any backend.
#[derive(Debug, Clone, Default)]
pub struct EchoBrain {
    /// Optional prefix to add before the echo.
    prefix: Option<String>,
}

impl EchoBrain {
    /// Create a new EchoBrain with no prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new EchoBrain with a custom prefix.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mock_brain::EchoBrain;
    ///
    /// let brain = EchoBrain::with_prefix("Eco: ");
    /// // Will respond with "Eco: <original message>"
    /// ```
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

#[async_trait]
impl Brain for EchoBrain {
    async fn process(&self, message: InboundMessage) -> Result<OutboundMessage, BrainError> {
        let response_text = match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, message.text),
            None => message.text.clone(),
        };

        Ok(OutboundMessage::reply_to(&message, response_text))
    }

    fn name(&self) -> &str {
        "EchoBrain"
    }
}
