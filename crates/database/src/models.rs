//! Database models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A persisted bridge session, keyed by client id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SessionRecord {
    /// Client identifier the bridge session belongs to.
    pub client_id: String,
    /// Opaque serialized credential bundle.
    pub session_data: Vec<u8>,
    /// Last time the blob was written.
    pub updated_at: DateTime<Utc>,
}

/// Direction of a logged message relative to the business account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

/// Who produced an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ResponseSource {
    /// A human operator replying from the business phone.
    Manual,
    /// The automation backend.
    Automation,
    /// Fixed system text (handoff acknowledgement, catalog miss).
    System,
    /// Apology sent after a backend failure.
    Error,
}

/// A row of the append-only message log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MessageRecord {
    pub id: i64,
    /// Provider message id, when known.
    pub message_id: Option<String>,
    pub from_number: Option<String>,
    pub to_number: Option<String>,
    pub tenant_id: i64,
    pub direction: Direction,
    pub body: Option<String>,
    pub content_type: String,
    /// Raw provider envelope serialized as JSON.
    pub raw_envelope: String,
    pub response_source: Option<ResponseSource>,
    pub created_at: DateTime<Utc>,
}

/// A message about to be appended to the log.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub message_id: Option<String>,
    pub from_number: Option<String>,
    pub to_number: Option<String>,
    pub tenant_id: i64,
    pub direction: Direction,
    pub body: Option<String>,
    pub content_type: String,
    pub raw_envelope: String,
    pub response_source: Option<ResponseSource>,
}

impl NewMessage {
    /// An outbound text message produced by the bot or an operator.
    pub fn outbound(
        from_number: Option<String>,
        to_number: impl Into<String>,
        tenant_id: i64,
        body: impl Into<String>,
        source: ResponseSource,
    ) -> Self {
        Self {
            message_id: None,
            from_number,
            to_number: Some(to_number.into()),
            tenant_id,
            direction: Direction::Outbound,
            body: Some(body.into()),
            content_type: "conversation".to_string(),
            raw_envelope: "{}".to_string(),
            response_source: Some(source),
        }
    }
}

/// Handoff state for one client of one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ManualResponse {
    pub client_number: String,
    pub tenant_id: i64,
    /// Whether a human operator currently owns the conversation.
    pub manual_response: bool,
    pub last_response_at: DateTime<Utc>,
    /// Number of times a handoff was requested.
    pub invocation_count: i64,
}

/// Kind of operator notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Customer asked for a human.
    Handoff,
    /// Customer waiting on an operator reply.
    Unanswered,
    /// Backend failed while answering the customer.
    BackendError,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub size: String,
    pub price: f64,
    pub description: Option<String>,
    pub photo_url: Option<String>,
}

/// An order captured from a confirmed conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i64,
    pub client_number: String,
    pub tenant_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub size: String,
    pub price: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
