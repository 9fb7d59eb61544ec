//! Per-message delivery pipeline: persist, classify, forward, validate, reply.

use std::sync::Arc;
use std::time::Duration;

use brain_core::{Brain, HistoryMessage, InboundMessage};
use chrono::{DateTime, Utc};
use database::{
    message_log, order, Database, Direction, MessageRecord, NewMessage, NotificationKind,
    ResponseSource,
};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use wa_bridge::ProviderMessage;

use crate::catalog::{self, CatalogOutcome};
use crate::classifier::{classify, Classified};
use crate::context::SessionContext;
use crate::error::ProcessorError;
use crate::handoff::{is_handoff_request, HandoffTracker, HANDOFF_EXPIRY, UNANSWERED_AFTER};
use crate::notify::OperatorNotifier;
use crate::sender::{MessageSender, SendReceipt};

/// Default timeout for backend processing (60 seconds).
pub const DEFAULT_BRAIN_TIMEOUT: Duration = Duration::from_secs(60);

/// Default number of logged messages sent to the backend as history.
pub const DEFAULT_HISTORY_LIMIT: i64 = 10;

/// How often the handoff sweep runs.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Sent to the customer when the backend fails.
pub const APOLOGY_TEXT: &str =
    "Lo sentimos, tuvimos un problema al procesar tu mensaje. Intenta de nuevo en unos minutos.";

/// Sent to the customer when they ask for a human.
pub const HANDOFF_ACK_TEXT: &str =
    "Un asesor humano te atenderá en breve. Gracias por tu paciencia.";

const STATUS_BROADCAST: &str = "status@broadcast";

/// Configuration for the delivery pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Tenant every message is logged under.
    pub tenant_id: i64,

    /// Timeout for backend processing. A timeout is treated like any other
    /// backend failure.
    pub brain_timeout: Duration,

    /// Number of previous messages passed to the backend.
    pub history_limit: i64,

    /// Operator phone number for handoff and error alerts.
    pub operator_number: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tenant_id: 1,
            brain_timeout: DEFAULT_BRAIN_TIMEOUT,
            history_limit: DEFAULT_HISTORY_LIMIT,
            operator_number: None,
        }
    }
}

impl PipelineConfig {
    pub fn with_tenant_id(mut self, tenant_id: i64) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    pub fn with_brain_timeout(mut self, timeout: Duration) -> Self {
        self.brain_timeout = timeout;
        self
    }

    pub fn with_history_limit(mut self, limit: i64) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_operator_number(mut self, number: impl Into<String>) -> Self {
        self.operator_number = Some(number.into());
        self
    }
}

/// Result of processing a single provider message.
#[derive(Debug)]
pub enum ProcessResult {
    /// A reply was sent to the customer.
    Responded {
        recipient: String,
        response: String,
        source: ResponseSource,
    },
    /// The customer asked for a human and was acknowledged.
    HandoffRequested { client: String },
    /// An operator replied from the business phone.
    ManualReplyRecorded { client: String },
    /// Nothing to answer (duplicate, status broadcast, no text, handoff active).
    Skipped { reason: String },
    /// Processing failed; the loop continues.
    Error(ProcessorError),
}

/// Counts from one handoff sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub cleared: usize,
    pub notified: usize,
}

/// Everything needed to answer a message, shared between the event loop,
/// the sweep task and the HTTP API.
pub struct Pipeline {
    db: Database,
    brain: Arc<dyn Brain>,
    sender: Arc<dyn MessageSender>,
    context: Arc<SessionContext>,
    handoff: HandoffTracker,
    notifier: OperatorNotifier,
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline. Handoff flags set before this call are treated as stale.
    pub fn new(
        db: Database,
        brain: Arc<dyn Brain>,
        sender: Arc<dyn MessageSender>,
        context: Arc<SessionContext>,
        config: PipelineConfig,
    ) -> Self {
        let handoff = HandoffTracker::new(db.clone(), Utc::now());
        let notifier = OperatorNotifier::new(db.clone(), config.operator_number.clone());
        Self {
            db,
            brain,
            sender,
            context,
            handoff,
            notifier,
            config,
        }
    }

    /// Override the process start used for stale handoff detection.
    pub fn with_process_start(mut self, process_start: DateTime<Utc>) -> Self {
        self.handoff = HandoffTracker::new(self.db.clone(), process_start);
        self
    }

    pub fn brain(&self) -> &Arc<dyn Brain> {
        &self.brain
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn handoff(&self) -> &HandoffTracker {
        &self.handoff
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process one provider message to completion.
    pub async fn process_message(&self, message: &ProviderMessage) -> ProcessResult {
        match self.try_process(message).await {
            Ok(result) => result,
            Err(e) => ProcessResult::Error(e),
        }
    }

    async fn try_process(&self, message: &ProviderMessage) -> Result<ProcessResult, ProcessorError> {
        let id = message.key.id.as_str();
        if !id.is_empty() && !self.context.dedup().check_and_insert(id).await {
            return Ok(skipped("duplicate message"));
        }

        if message.key.remote_jid == STATUS_BROADCAST {
            return Ok(skipped("status broadcast"));
        }

        let own = self.context.own_number().await;
        let classified = classify(message, own.as_deref());

        let Some(client) = classified.client().map(str::to_string) else {
            return Ok(skipped("no client number"));
        };
        let tenant_id = self.config.tenant_id;
        let now = Utc::now();

        if classified.is_outgoing {
            return self.record_manual_reply(&classified, &client, now).await;
        }

        message_log::insert_message(self.db.pool(), &inbound_record(&classified, tenant_id))
            .await?;
        debug!(client = %client, content_type = %classified.content_type, "Inbound message logged");

        let Some(text) = classified.text.clone().filter(|t| !t.trim().is_empty()) else {
            return Ok(skipped("no text content"));
        };

        let target = classified.reply_target().to_string();

        if is_handoff_request(&text) {
            info!(client = %client, tenant_id, "Customer requested a human");
            self.handoff.activate(&client, tenant_id, now).await?;
            if let Err(e) = self
                .notify_operator(&client, tenant_id, NotificationKind::Handoff, now, None)
                .await
            {
                warn!(client = %client, "Failed to notify operator of handoff: {}", e);
            }
            self.send_and_log(&target, &client, HANDOFF_ACK_TEXT, ResponseSource::System)
                .await?;
            return Ok(ProcessResult::HandoffRequested { client });
        }

        if self.handoff.check(&client, tenant_id, now).await?.is_suppressed() {
            return Ok(skipped("handoff active"));
        }

        let history = self.load_history(&client, &classified.id).await?;
        let timestamp = message
            .message_timestamp
            .unwrap_or_else(|| now.timestamp().max(0) as u64);
        let inbound = if classified.is_group {
            InboundMessage::group(&client, &text, timestamp, &classified.chat)
        } else {
            InboundMessage::direct(&client, &text, timestamp)
        }
        .with_history(history);

        let reply = match timeout(self.config.brain_timeout, self.brain.process(inbound)).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                return self
                    .recover_from_backend_failure(&target, &client, ProcessorError::Brain(e))
                    .await
            }
            Err(_elapsed) => {
                return self
                    .recover_from_backend_failure(
                        &target,
                        &client,
                        ProcessorError::Timeout(self.config.brain_timeout),
                    )
                    .await
            }
        };

        let outcome = catalog::validate(&self.db, &reply.text).await?;
        let response = outcome.reply_text(&reply.text);
        let source = match outcome {
            CatalogOutcome::NotFound { .. } => ResponseSource::System,
            _ => ResponseSource::Automation,
        };

        self.send_and_log(&target, &client, &response, source).await?;

        if let CatalogOutcome::Validated { product, .. } = &outcome {
            if let Some(url) = product.photo_url.as_deref() {
                match self.sender.send_media(&target, url, None).await {
                    Ok(receipt) => self.remember_sent(&receipt).await,
                    Err(e) => warn!(client = %client, "Failed to send product photo: {}", e),
                }
            }
        }

        if catalog::is_affirmation(&text) {
            if let Some(pending) = self.context.take_pending_product(&client).await {
                let order_id = order::create_order(self.db.pool(), &client, tenant_id, &pending)
                    .await?;
                info!(client = %client, order_id, product = %pending.name, "Order captured");
            }
        }

        if let CatalogOutcome::Validated { product, .. } = outcome {
            self.context.set_pending_product(&client, product).await;
        }

        Ok(ProcessResult::Responded {
            recipient: target,
            response,
            source,
        })
    }

    async fn record_manual_reply(
        &self,
        classified: &Classified,
        client: &str,
        now: DateTime<Utc>,
    ) -> Result<ProcessResult, ProcessorError> {
        let tenant_id = self.config.tenant_id;
        let record = NewMessage {
            message_id: non_empty_id(&classified.id),
            from_number: classified.from.clone(),
            to_number: Some(client.to_string()),
            tenant_id,
            direction: Direction::Outbound,
            body: classified.text.clone(),
            content_type: classified.content_type.clone(),
            raw_envelope: classified.raw_envelope.clone(),
            response_source: Some(ResponseSource::Manual),
        };
        message_log::insert_message(self.db.pool(), &record).await?;
        self.handoff.record_manual_reply(client, tenant_id, now).await?;

        info!(client, tenant_id, "Manual operator reply recorded");
        Ok(ProcessResult::ManualReplyRecorded {
            client: client.to_string(),
        })
    }

    async fn recover_from_backend_failure(
        &self,
        target: &str,
        client: &str,
        failure: ProcessorError,
    ) -> Result<ProcessResult, ProcessorError> {
        error!(client, "Backend failed: {}", failure);

        self.send_and_log(target, client, APOLOGY_TEXT, ResponseSource::Error)
            .await?;

        let detail = failure.to_string();
        if let Err(e) = self
            .notify_operator(
                client,
                self.config.tenant_id,
                NotificationKind::BackendError,
                Utc::now(),
                Some(&detail),
            )
            .await
        {
            warn!(client, "Failed to notify operator of backend failure: {}", e);
        }

        Ok(ProcessResult::Responded {
            recipient: target.to_string(),
            response: APOLOGY_TEXT.to_string(),
            source: ResponseSource::Error,
        })
    }

    /// Recent conversation with `client`, oldest first, excluding the
    /// message currently being answered.
    async fn load_history(
        &self,
        client: &str,
        current_id: &str,
    ) -> Result<Vec<HistoryMessage>, ProcessorError> {
        let limit = self.config.history_limit.max(0);
        let rows = message_log::recent_messages(
            self.db.pool(),
            client,
            self.config.tenant_id,
            limit + 1,
        )
        .await?;

        let mut history: Vec<HistoryMessage> = rows
            .iter()
            .filter(|row| current_id.is_empty() || row.message_id.as_deref() != Some(current_id))
            .filter_map(history_entry)
            .collect();

        let excess = history.len().saturating_sub(limit as usize);
        history.drain(..excess);
        Ok(history)
    }

    /// Send a text, remember its id for echo suppression and log it.
    pub async fn send_and_log(
        &self,
        recipient: &str,
        client: &str,
        text: &str,
        source: ResponseSource,
    ) -> Result<SendReceipt, ProcessorError> {
        let receipt = self.sender.send_text(recipient, text).await?;
        self.remember_sent(&receipt).await;

        let mut record = NewMessage::outbound(
            self.context.own_number().await,
            client,
            self.config.tenant_id,
            text,
            source,
        );
        record.message_id = receipt.id.clone();
        message_log::insert_message(self.db.pool(), &record).await?;

        debug!(recipient, ?source, "Reply sent and logged");
        Ok(receipt)
    }

    /// Send an image by URL on behalf of the HTTP API.
    pub async fn send_media(
        &self,
        recipient: &str,
        url: &str,
        caption: Option<&str>,
    ) -> Result<SendReceipt, ProcessorError> {
        let receipt = self.sender.send_media(recipient, url, caption).await?;
        self.remember_sent(&receipt).await;
        Ok(receipt)
    }

    async fn remember_sent(&self, receipt: &SendReceipt) {
        if let Some(id) = receipt.id.as_deref() {
            self.context.dedup().insert(id).await;
        }
    }

    /// Alert the operator and remember the alert's id so its echo is skipped.
    async fn notify_operator(
        &self,
        client: &str,
        tenant_id: i64,
        kind: NotificationKind,
        now: DateTime<Utc>,
        detail: Option<&str>,
    ) -> Result<bool, ProcessorError> {
        let receipt = self
            .notifier
            .notify(self.sender.as_ref(), client, tenant_id, kind, now, detail)
            .await?;
        match receipt {
            Some(receipt) => {
                self.remember_sent(&receipt).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Clear expired or stale handoffs and alert the operator about customers
    /// waiting on a human.
    ///
    /// A failed alert is logged and the sweep moves on to the next client.
    pub async fn sweep_handoffs(
        &self,
        now: DateTime<Utc>,
    ) -> Result<SweepReport, ProcessorError> {
        let pool = self.db.pool();
        let mut report = SweepReport::default();

        let clients =
            message_log::active_clients_since(pool, now - chrono::Duration::hours(24)).await?;

        for (client, tenant_id) in clients {
            let Some(state) = database::manual_response::get_state(pool, &client, tenant_id).await?
            else {
                continue;
            };
            if !state.manual_response {
                continue;
            }

            let waiting = now - state.last_response_at;
            if waiting > HANDOFF_EXPIRY || state.last_response_at < self.handoff.process_start() {
                self.handoff.clear(&client, tenant_id).await?;
                report.cleared += 1;
            } else if waiting > UNANSWERED_AFTER {
                match self
                    .notify_operator(&client, tenant_id, NotificationKind::Unanswered, now, None)
                    .await
                {
                    Ok(true) => report.notified += 1,
                    Ok(false) => {}
                    Err(e) => {
                        warn!(client = %client, "Failed to alert operator of waiting customer: {}", e)
                    }
                }
            }
        }

        if report != SweepReport::default() {
            info!(
                cleared = report.cleared,
                notified = report.notified,
                "Handoff sweep finished"
            );
        }
        Ok(report)
    }

    /// Run [`Pipeline::sweep_handoffs`] every `interval` until the task is aborted.
    pub fn spawn_handoff_sweep(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let pipeline = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = pipeline.sweep_handoffs(Utc::now()).await {
                    warn!("Handoff sweep failed: {}", e);
                }
            }
        })
    }
}

fn skipped(reason: &str) -> ProcessResult {
    debug!("Skipping message: {}", reason);
    ProcessResult::Skipped {
        reason: reason.to_string(),
    }
}

fn non_empty_id(id: &str) -> Option<String> {
    (!id.is_empty()).then(|| id.to_string())
}

fn inbound_record(classified: &Classified, tenant_id: i64) -> NewMessage {
    NewMessage {
        message_id: non_empty_id(&classified.id),
        from_number: classified.from.clone(),
        to_number: classified.to.clone(),
        tenant_id,
        direction: Direction::Inbound,
        body: classified.text.clone(),
        content_type: classified.content_type.clone(),
        raw_envelope: classified.raw_envelope.clone(),
        response_source: None,
    }
}

fn history_entry(row: &MessageRecord) -> Option<HistoryMessage> {
    let body = row.body.as_deref().filter(|b| !b.is_empty())?;
    Some(match (row.direction, row.response_source) {
        (Direction::Inbound, _) => HistoryMessage::user(body),
        (Direction::Outbound, Some(ResponseSource::System)) => HistoryMessage::system(body),
        (Direction::Outbound, _) => HistoryMessage::assistant(body),
    })
}
