//! Webhook request and response bodies.

use serde::{Deserialize, Serialize};

/// JSON posted to the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    pub message: String,
    pub client_number: String,
    /// Plain-text transcript of the recent conversation.
    pub conversation_history: String,
}

/// JSON answered by the webhook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WebhookReply {
    #[serde(default)]
    pub reply: Option<String>,
}

/// Extract the reply text from a webhook response body.
///
/// JSON bodies must carry a non-empty `reply`; anything that is not JSON is
/// taken as the reply itself.
pub(crate) fn parse_reply(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(value @ serde_json::Value::Object(_)) => serde_json::from_value::<WebhookReply>(value)
            .ok()
            .and_then(|reply| reply.reply)
            .filter(|reply| !reply.trim().is_empty()),
        Ok(serde_json::Value::String(text)) if !text.trim().is_empty() => Some(text),
        Ok(_) => None,
        Err(_) => Some(trimmed.to_string()),
    }
}
