//! Operator notifications with a lookback window against repeats.

use chrono::{DateTime, Duration, Utc};
use database::{notification, Database, NotificationKind};
use tracing::{debug, info};

use crate::error::ProcessorError;
use crate::sender::{MessageSender, SendReceipt};

/// A notification of the same kind for the same client is sent at most
/// once per window.
pub const NOTIFICATION_LOOKBACK: Duration = Duration::minutes(20);

/// Sends alerts to the operator's phone.
#[derive(Debug, Clone)]
pub struct OperatorNotifier {
    db: Database,
    operator: Option<String>,
}

impl OperatorNotifier {
    pub fn new(db: Database, operator: Option<String>) -> Self {
        Self { db, operator }
    }

    pub fn operator(&self) -> Option<&str> {
        self.operator.as_deref()
    }

    /// Notify the operator unless the same alert went out within the window.
    ///
    /// Returns the receipt of the alert when one was sent.
    pub async fn notify(
        &self,
        sender: &dyn MessageSender,
        client: &str,
        tenant_id: i64,
        kind: NotificationKind,
        now: DateTime<Utc>,
        detail: Option<&str>,
    ) -> Result<Option<SendReceipt>, ProcessorError> {
        let Some(operator) = self.operator.as_deref() else {
            debug!(client, ?kind, "No operator number configured, skipping notification");
            return Ok(None);
        };

        let pool = self.db.pool();
        let since = now - NOTIFICATION_LOOKBACK;
        if notification::exists_since(pool, client, tenant_id, kind, since).await? {
            debug!(client, ?kind, "Operator already notified recently");
            return Ok(None);
        }

        let receipt = sender
            .send_text(operator, &notification_text(kind, client, detail))
            .await?;
        notification::insert_notification(pool, client, tenant_id, kind, now).await?;

        info!(client, tenant_id, ?kind, "Operator notified");
        Ok(Some(receipt))
    }
}

fn notification_text(kind: NotificationKind, client: &str, detail: Option<&str>) -> String {
    match kind {
        NotificationKind::Handoff => {
            format!("🔔 El cliente +{} pidió hablar con un humano.", client)
        }
        NotificationKind::Unanswered => format!(
            "⏰ El cliente +{} lleva más de 10 minutos esperando respuesta.",
            client
        ),
        NotificationKind::BackendError => format!(
            "⚠️ No se pudo responder automáticamente al cliente +{}: {}",
            client,
            detail.unwrap_or("error desconocido")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sender::RecordingSender;

    #[tokio::test]
    async fn test_notifies_once_per_window() {
        let db = Database::in_memory().await.unwrap();
        let notifier = OperatorNotifier::new(db, Some("5215599999999".to_string()));
        let sender = RecordingSender::new();
        let now = Utc::now();

        let first = notifier
            .notify(&sender, "555", 1, NotificationKind::Handoff, now, None)
            .await
            .unwrap();
        assert!(notifier
            .notify(&sender, "555", 1, NotificationKind::Handoff, now + Duration::minutes(5), None)
            .await
            .unwrap()
            .is_none());
        assert!(notifier
            .notify(&sender, "555", 1, NotificationKind::Handoff, now + Duration::minutes(21), None)
            .await
            .unwrap()
            .is_some());

        let sent = sender.sent_to("5215599999999").await;
        assert_eq!(sent.len(), 2);
        assert!(sent[0].text.contains("+555"));
        assert_eq!(first.and_then(|r| r.id), Some(sent[0].id.clone()));
    }

    #[tokio::test]
    async fn test_without_operator_is_noop() {
        let db = Database::in_memory().await.unwrap();
        let notifier = OperatorNotifier::new(db, None);
        let sender = RecordingSender::new();

        let sent = notifier
            .notify(&sender, "555", 1, NotificationKind::Unanswered, Utc::now(), None)
            .await
            .unwrap();
        assert!(sent.is_none());
        assert!(sender.sent().await.is_empty());
    }

    #[test]
    fn test_backend_error_text_includes_detail() {
        let text = notification_text(NotificationKind::BackendError, "555", Some("timeout"));
        assert!(text.ends_with("timeout"));
    }
}
