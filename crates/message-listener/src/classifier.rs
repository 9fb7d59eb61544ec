//! Normalization of provider messages into log-ready records.

use wa_bridge::{bare_number, is_group_jid, MessageContent, ProviderMessage};

/// A provider message reduced to what the relay logs and answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    /// Provider message id.
    pub id: String,
    /// Bare number of the author.
    pub from: Option<String>,
    /// Group jid for group chats, otherwise the bare number of the recipient.
    pub to: Option<String>,
    /// Content kind, annotated for ephemeral and view-once wrappers.
    pub content_type: String,
    pub text: Option<String>,
    /// Sent from the business account.
    pub is_outgoing: bool,
    pub is_group: bool,
    /// Chat jid replies are sent to.
    pub chat: String,
    /// Content object serialized as JSON.
    pub raw_envelope: String,
}

impl Classified {
    /// The customer this message belongs to: the author of inbound
    /// messages, the recipient of outgoing ones.
    pub fn client(&self) -> Option<&str> {
        if self.is_outgoing {
            self.to.as_deref()
        } else {
            self.from.as_deref()
        }
    }

    /// Where a reply should be addressed.
    pub fn reply_target(&self) -> &str {
        if self.is_group {
            &self.chat
        } else {
            bare_number(&self.chat)
        }
    }
}

/// Classify a provider message. `own_id` is the business account's jid or
/// number, when known.
///
/// Never fails: unreadable content is reported as `"unknown"` and missing
/// content as `"empty"`.
pub fn classify(message: &ProviderMessage, own_id: Option<&str>) -> Classified {
    let key = &message.key;
    let is_group = is_group_jid(&key.remote_jid);
    let own = own_id.map(|id| bare_number(id).to_string());
    let remote = non_empty(&key.remote_jid);

    let (from, to) = if key.from_me {
        let to = remote.map(|jid| {
            if is_group {
                jid.to_string()
            } else {
                bare_number(jid).to_string()
            }
        });
        (own, to)
    } else {
        let author = key.participant.as_deref().and_then(non_empty).or(remote);
        let to = if is_group {
            remote.map(str::to_string)
        } else {
            own.or_else(|| remote.map(|jid| bare_number(jid).to_string()))
        };
        (author.map(|jid| bare_number(jid).to_string()), to)
    };

    let (content_type, text, raw_envelope) = match &message.message {
        None => ("empty".to_string(), None, "{}".to_string()),
        Some(content) => {
            let (content_type, inner) = content_type_of(content);
            let raw = serde_json::to_string(content).unwrap_or_else(|_| "{}".to_string());
            (content_type, extract_text(inner), raw)
        }
    };

    Classified {
        id: key.id.clone(),
        from,
        to,
        content_type,
        text,
        is_outgoing: key.from_me,
        is_group,
        chat: key.remote_jid.clone(),
        raw_envelope,
    }
}

/// Content type plus the content the text should be read from.
///
/// Ephemeral and view-once wrappers are unwrapped one level.
fn content_type_of(content: &MessageContent) -> (String, &MessageContent) {
    let Some(outer) = content.primary_key() else {
        return ("unknown".to_string(), content);
    };

    let (wrapper, label) = match outer {
        "ephemeralMessage" => (content.ephemeral_message.as_ref(), "ephemeral"),
        "viewOnceMessage" => (content.view_once_message.as_ref(), "view once"),
        "viewOnceMessageV2" => (content.view_once_message_v2.as_ref(), "view once"),
        _ => return (outer.to_string(), content),
    };

    match wrapper.and_then(|w| w.message.as_deref()) {
        Some(inner) => {
            let inner_type = inner.primary_key().unwrap_or("unknown");
            (format!("{} ({})", inner_type, label), inner)
        }
        None => (outer.to_string(), content),
    }
}

/// First non-empty text-bearing field, in priority order.
fn extract_text(content: &MessageContent) -> Option<String> {
    let candidates = [
        content.conversation.as_deref(),
        content
            .extended_text_message
            .as_ref()
            .and_then(|m| m.text.as_deref()),
        content.image_message.as_ref().and_then(|m| m.caption.as_deref()),
        content.video_message.as_ref().and_then(|m| m.caption.as_deref()),
        content
            .document_message
            .as_ref()
            .and_then(|m| m.caption.as_deref()),
        content.buttons_response_message.as_ref().and_then(|m| {
            first_non_empty([
                m.selected_display_text.as_deref(),
                m.selected_button_id.as_deref(),
            ])
        }),
        content.list_response_message.as_ref().and_then(|m| {
            first_non_empty([
                m.single_select_reply
                    .as_ref()
                    .and_then(|r| r.selected_row_id.as_deref()),
                m.title.as_deref(),
            ])
        }),
        content.template_button_reply_message.as_ref().and_then(|m| {
            first_non_empty([m.selected_display_text.as_deref(), m.selected_id.as_deref()])
        }),
        content
            .reaction_message
            .as_ref()
            .and_then(|m| first_non_empty([m.emoji.as_deref(), m.text.as_deref()])),
    ];

    first_non_empty(candidates).map(str::to_string)
}

fn first_non_empty<'a, const N: usize>(values: [Option<&'a str>; N]) -> Option<&'a str> {
    values.into_iter().flatten().find(|s| !s.is_empty())
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}
