//! Events pushed by the bridge over SSE.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::message::ProviderMessage;

/// SSE event name for new or updated messages.
pub const MESSAGES_UPSERT: &str = "messages.upsert";
/// SSE event name for connection state changes.
pub const CONNECTION_UPDATE: &str = "connection.update";
/// SSE event name for refreshed credentials.
pub const CREDS_UPDATE: &str = "creds.update";

/// Disconnect status code meaning the device was logged out.
pub const STATUS_LOGGED_OUT: u16 = 401;

/// A decoded bridge event.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    Messages(UpsertBatch),
    Connection(ConnectionUpdate),
    Creds(CredsUpdate),
}

impl BridgeEvent {
    /// Decode an SSE event by name. Unknown names yield `Ok(None)`.
    pub fn parse(event: &str, data: &str) -> Result<Option<Self>, serde_json::Error> {
        Ok(match event {
            MESSAGES_UPSERT => Some(Self::Messages(serde_json::from_str(data)?)),
            CONNECTION_UPDATE => Some(Self::Connection(serde_json::from_str(data)?)),
            CREDS_UPDATE => Some(Self::Creds(serde_json::from_str(data)?)),
            _ => None,
        })
    }
}

/// A batch of messages from `messages.upsert`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertBatch {
    /// "notify" for live messages, "append" for history sync.
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub messages: Vec<ProviderMessage>,
}

impl UpsertBatch {
    /// Whether the batch carries live messages that should be answered.
    pub fn is_notify(&self) -> bool {
        self.kind == "notify"
    }
}

/// Connection state reported by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connecting,
    Open,
    Close,
}

/// Payload of `connection.update`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<ConnectionState>,

    /// Login QR payload to render for scanning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_disconnect: Option<LastDisconnect>,
}

impl ConnectionUpdate {
    /// Whether the connection closed because the device was logged out.
    pub fn is_logged_out(&self) -> bool {
        self.connection == Some(ConnectionState::Close)
            && self
                .last_disconnect
                .as_ref()
                .and_then(|d| d.status_code)
                .map_or(false, |code| code == STATUS_LOGGED_OUT)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastDisconnect {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

/// Payload of `creds.update`: the opaque credential bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredsUpdate {
    pub creds: Value,
}
