//! Request and response bodies for the bridge REST endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /api/v1/send`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendTextRequest {
    pub jid: String,
    pub text: String,
}

/// Body of `POST /api/v1/send-media`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendMediaRequest {
    pub jid: String,
    /// Public URL the bridge downloads the media from.
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// Result of a successful send.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SendResult {
    /// Provider message id; the bridge echoes it back in `messages.upsert`.
    pub id: String,
    #[serde(default)]
    pub timestamp: u64,
}

/// Body of `PUT /api/v1/session`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestoreSessionRequest<'a> {
    pub creds: &'a Value,
}

/// Response of `GET /api/v1/me`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountInfo {
    /// Own jid, possibly with a device suffix.
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Error body returned by the bridge.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}
