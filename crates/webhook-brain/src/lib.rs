//! Brain that forwards customer messages to a workflow-automation webhook.
//!
//! Each message is posted as JSON:
//!
//! ```json
//! {"message": "Quiero una pizza", "clientNumber": "5215512345678", "conversationHistory": "Cliente: Hola\nBot: ¡Hola!"}
//! ```
//!
//! The webhook answers with `{"reply": "..."}`. A plain-text body is used
//! verbatim.

mod brain;
mod config;
mod types;

pub use brain::WebhookBrain;
pub use config::WebhookBrainConfig;
pub use types::{WebhookReply, WebhookRequest};

pub use brain_core::{async_trait, Brain, BrainError, InboundMessage, OutboundMessage};
