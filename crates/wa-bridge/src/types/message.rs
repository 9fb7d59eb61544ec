//! Provider message types as relayed by the bridge.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A message event relayed from WhatsApp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderMessage {
    /// Addressing information.
    pub key: MessageKey,

    /// Message content; absent for protocol-only events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<MessageContent>,

    /// Send time (seconds since epoch). The bridge may encode it as a string.
    #[serde(
        default,
        deserialize_with = "deserialize_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub message_timestamp: Option<u64>,

    /// Display name of the sender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_name: Option<String>,
}

/// Message addressing key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageKey {
    /// Chat jid: the contact for direct chats, the group for group chats.
    #[serde(default)]
    pub remote_jid: String,

    /// True when the message was sent from the business account.
    #[serde(default)]
    pub from_me: bool,

    #[serde(default)]
    pub id: String,

    /// Author jid inside a group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant: Option<String>,
}

/// The content object of a provider message.
///
/// Only the kinds the relay reads are typed; everything else lands in
/// `other`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_text_message: Option<ExtendedTextMessage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_message: Option<MediaMessage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_message: Option<MediaMessage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_message: Option<MediaMessage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buttons_response_message: Option<ButtonsResponseMessage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_response_message: Option<ListResponseMessage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_button_reply_message: Option<TemplateButtonReplyMessage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reaction_message: Option<ReactionMessage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeral_message: Option<WrappedMessage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_once_message: Option<WrappedMessage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_once_message_v2: Option<WrappedMessage>,

    /// Content kinds without a typed field (audio, stickers, context info).
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Keys that accompany real content but never are content themselves.
const NON_CONTENT_KEYS: [&str; 2] = ["senderKeyDistributionMessage", "messageContextInfo"];

impl MessageContent {
    /// Keys of the content kinds present, typed kinds first.
    pub fn content_keys(&self) -> Vec<&str> {
        let typed = [
            ("conversation", self.conversation.is_some()),
            ("extendedTextMessage", self.extended_text_message.is_some()),
            ("imageMessage", self.image_message.is_some()),
            ("videoMessage", self.video_message.is_some()),
            ("documentMessage", self.document_message.is_some()),
            ("buttonsResponseMessage", self.buttons_response_message.is_some()),
            ("listResponseMessage", self.list_response_message.is_some()),
            (
                "templateButtonReplyMessage",
                self.template_button_reply_message.is_some(),
            ),
            ("reactionMessage", self.reaction_message.is_some()),
            ("ephemeralMessage", self.ephemeral_message.is_some()),
            ("viewOnceMessage", self.view_once_message.is_some()),
            ("viewOnceMessageV2", self.view_once_message_v2.is_some()),
        ];

        typed
            .into_iter()
            .filter_map(|(key, present)| present.then_some(key))
            .chain(
                self.other
                    .iter()
                    .filter(|(_, value)| !value.is_null())
                    .map(|(key, _)| key.as_str()),
            )
            .filter(|key| {
                (*key == "conversation" || key.contains("Message"))
                    && !NON_CONTENT_KEYS.iter().any(|skip| skip == key)
            })
            .collect()
    }

    /// The primary content kind, if any.
    pub fn primary_key(&self) -> Option<&str> {
        self.content_keys().into_iter().next()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedTextMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Image, video or document content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonsResponseMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_button_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_display_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponseMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_select_reply: Option<SingleSelectReply>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleSelectReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_row_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateButtonReplyMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_display_text: Option<String>,
}

/// A reaction. Depending on the bridge version the emoji is in `emoji` or `text`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Ephemeral and view-once wrappers around the real content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WrappedMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Box<MessageContent>>,
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Timestamp {
        Number(u64),
        Text(String),
        Long { low: u32, high: u32 },
    }

    Ok(match Option::<Timestamp>::deserialize(deserializer)? {
        Some(Timestamp::Number(n)) => Some(n),
        Some(Timestamp::Text(s)) => s.parse().ok(),
        Some(Timestamp::Long { low, high }) => Some(((high as u64) << 32) | low as u64),
        None => None,
    })
}
