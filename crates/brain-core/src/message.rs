//! Message types exchanged with a brain.

use serde::{Deserialize, Serialize};

use crate::history::HistoryMessage;

/// A customer message handed to a brain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Bare phone number of the customer.
    pub sender: String,
    /// Extracted text content.
    pub text: String,
    /// Provider timestamp (seconds since epoch).
    pub timestamp: u64,
    /// Group jid when the message was posted in a group.
    pub group_id: Option<String>,
    /// Recent conversation with this customer, oldest first.
    #[serde(default)]
    pub history: Vec<HistoryMessage>,
}

impl InboundMessage {
    /// Create a direct message.
    pub fn direct(sender: impl Into<String>, text: impl Into<String>, timestamp: u64) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
            timestamp,
            group_id: None,
            history: Vec::new(),
        }
    }

    /// Create a group message.
    pub fn group(
        sender: impl Into<String>,
        text: impl Into<String>,
        timestamp: u64,
        group_id: impl Into<String>,
    ) -> Self {
        Self {
            group_id: Some(group_id.into()),
            ..Self::direct(sender, text, timestamp)
        }
    }

    /// Attach conversation history.
    pub fn with_history(mut self, history: Vec<HistoryMessage>) -> Self {
        self.history = history;
        self
    }

    /// Whether the message came from a group chat.
    pub fn is_group(&self) -> bool {
        self.group_id.is_some()
    }
}

/// A reply produced by a brain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Phone number or group jid to deliver to.
    pub recipient: String,
    /// Reply text, possibly structured (JSON) for catalog validation.
    pub text: String,
    /// Whether `recipient` is a group.
    pub is_group: bool,
}

impl OutboundMessage {
    /// Build a reply addressed to wherever `message` came from.
    pub fn reply_to(message: &InboundMessage, text: impl Into<String>) -> Self {
        match &message.group_id {
            Some(group_id) => Self {
                recipient: group_id.clone(),
                text: text.into(),
                is_group: true,
            },
            None => Self::direct(message.sender.clone(), text),
        }
    }

    /// Build a direct message.
    pub fn direct(recipient: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            text: text.into(),
            is_group: false,
        }
    }
}
