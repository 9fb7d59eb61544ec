//! Conversation history passed to backends.

use serde::{Deserialize, Serialize};

/// A single message in the conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    /// Role: "user" or "assistant"
    pub role: String,
    /// Message content
    pub content: String,
}

impl HistoryMessage {
    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Render history as the plain-text transcript webhooks expect.
///
/// Customer lines are prefixed `Cliente:` and replies `Bot:`, one per line.
///
/// # Example
///
/// ```rust
/// use brain_core::{format_transcript, HistoryMessage};
///
/// let history = vec![
///     HistoryMessage::user("Hola"),
///     HistoryMessage::assistant("¿Qué deseas ordenar?"),
/// ];
/// assert_eq!(format_transcript(&history), "Cliente: Hola\nBot: ¿Qué deseas ordenar?");
/// ```
pub fn format_transcript(history: &[HistoryMessage]) -> String {
    history
        .iter()
        .map(|msg| {
            let speaker = match msg.role.as_str() {
                "user" => "Cliente",
                "system" => "Sistema",
                _ => "Bot",
            };
            format!("{}: {}", speaker, msg.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_transcript_empty() {
        assert_eq!(format_transcript(&[]), "");
    }

    #[test]
    fn test_format_transcript_roles() {
        let history = vec![
            HistoryMessage::user("Quiero una pizza"),
            HistoryMessage::assistant("¿De qué tamaño?"),
            HistoryMessage::system("Un asesor te atenderá"),
        ];
        let transcript = format_transcript(&history);
        assert_eq!(
            transcript,
            "Cliente: Quiero una pizza\nBot: ¿De qué tamaño?\nSistema: Un asesor te atenderá"
        );
    }
}
