//! Human handoff detection and the per-client suppression state.

use chrono::{DateTime, Duration, Utc};
use database::{manual_response, Database, DatabaseError};
use tracing::info;

/// Phrases that ask for a human, matched case-insensitively anywhere in the text.
pub const HANDOFF_KEYWORDS: &[&str] = &[
    "hablar con un humano",
    "hablar con una persona",
    "hablar con un asesor",
    "necesito ayuda humana",
    "agente humano",
    "talk to a person",
    "talk to a human",
    "need human help",
];

/// How long a handoff keeps automation paused after the last human activity.
pub const HANDOFF_EXPIRY: Duration = Duration::hours(1);

/// A handoff with no operator activity for this long triggers an alert.
pub const UNANSWERED_AFTER: Duration = Duration::minutes(10);

/// Whether a customer message asks for a human operator.
pub fn is_handoff_request(text: &str) -> bool {
    let text = text.to_lowercase();
    HANDOFF_KEYWORDS.iter().any(|keyword| text.contains(keyword))
}

/// Outcome of checking whether automation may answer a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffDecision {
    /// No handoff in progress.
    Automate,
    /// A human owns the conversation.
    Suppress,
    /// The flag predates this process and was cleared.
    ClearedStale,
    /// The flag outlived the expiry window and was cleared.
    ClearedExpired,
}

impl HandoffDecision {
    pub fn is_suppressed(self) -> bool {
        self == HandoffDecision::Suppress
    }
}

/// Reads and updates the persisted handoff flags.
#[derive(Debug, Clone)]
pub struct HandoffTracker {
    db: Database,
    process_start: DateTime<Utc>,
    expiry: Duration,
}

impl HandoffTracker {
    /// Create a tracker for a process that started at `process_start`.
    pub fn new(db: Database, process_start: DateTime<Utc>) -> Self {
        Self {
            db,
            process_start,
            expiry: HANDOFF_EXPIRY,
        }
    }

    pub fn process_start(&self) -> DateTime<Utc> {
        self.process_start
    }

    /// Decide whether automation may answer, clearing stale or expired flags.
    ///
    /// Store failures are returned, not treated as "no handoff".
    pub async fn check(
        &self,
        client: &str,
        tenant_id: i64,
        now: DateTime<Utc>,
    ) -> Result<HandoffDecision, DatabaseError> {
        let pool = self.db.pool();

        let Some(state) = manual_response::get_state(pool, client, tenant_id).await? else {
            return Ok(HandoffDecision::Automate);
        };

        if !state.manual_response {
            return Ok(HandoffDecision::Automate);
        }

        if state.last_response_at < self.process_start {
            manual_response::clear(pool, client, tenant_id).await?;
            info!(client, tenant_id, "Cleared handoff flag set before process start");
            return Ok(HandoffDecision::ClearedStale);
        }

        if now - state.last_response_at > self.expiry {
            manual_response::clear(pool, client, tenant_id).await?;
            info!(client, tenant_id, "Cleared expired handoff flag");
            return Ok(HandoffDecision::ClearedExpired);
        }

        Ok(HandoffDecision::Suppress)
    }

    /// Hand the conversation to a human.
    pub async fn activate(
        &self,
        client: &str,
        tenant_id: i64,
        now: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        manual_response::activate(self.db.pool(), client, tenant_id, now).await
    }

    /// A human replied from the business phone; keep automation paused.
    pub async fn record_manual_reply(
        &self,
        client: &str,
        tenant_id: i64,
        now: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        manual_response::record_manual_reply(self.db.pool(), client, tenant_id, now).await
    }

    /// Resume automation for a client.
    pub async fn clear(&self, client: &str, tenant_id: i64) -> Result<(), DatabaseError> {
        manual_response::clear(self.db.pool(), client, tenant_id).await
    }
}
