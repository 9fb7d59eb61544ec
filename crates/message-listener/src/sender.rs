//! Outbound message transport.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use wa_bridge::BridgeClient;

use crate::error::ProcessorError;

/// What the transport reports after a send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendReceipt {
    /// Provider id of the sent message, used to skip its echo.
    pub id: Option<String>,
}

/// Trait for delivering messages to WhatsApp.
///
/// Abstracted so the pipeline can run against the bridge or a test double.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Send a text message to a number or group jid.
    async fn send_text(&self, recipient: &str, text: &str) -> Result<SendReceipt, ProcessorError>;

    /// Send an image by URL.
    async fn send_media(
        &self,
        recipient: &str,
        url: &str,
        caption: Option<&str>,
    ) -> Result<SendReceipt, ProcessorError>;
}

#[async_trait]
impl MessageSender for BridgeClient {
    async fn send_text(&self, recipient: &str, text: &str) -> Result<SendReceipt, ProcessorError> {
        let result = BridgeClient::send_text(self, recipient, text).await?;
        Ok(SendReceipt {
            id: Some(result.id),
        })
    }

    async fn send_media(
        &self,
        recipient: &str,
        url: &str,
        caption: Option<&str>,
    ) -> Result<SendReceipt, ProcessorError> {
        let result = BridgeClient::send_media(self, recipient, url, caption).await?;
        Ok(SendReceipt {
            id: Some(result.id),
        })
    }
}

/// A message delivered through [`RecordingSender`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub recipient: String,
    pub text: String,
    pub media_url: Option<String>,
    pub id: String,
}

/// A sender that keeps every message in memory instead of delivering it.
#[derive(Debug, Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<SentMessage>>,
    counter: AtomicUsize,
    failing: AtomicBool,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Everything sent so far, in order.
    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    /// Messages sent to one recipient.
    pub async fn sent_to(&self, recipient: &str) -> Vec<SentMessage> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|m| m.recipient == recipient)
            .cloned()
            .collect()
    }

    async fn record(
        &self,
        recipient: &str,
        text: &str,
        media_url: Option<&str>,
    ) -> Result<SendReceipt, ProcessorError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ProcessorError::Send("recording sender set to fail".to_string()));
        }

        let id = format!("SENT-{}", self.counter.fetch_add(1, Ordering::SeqCst) + 1);
        self.sent.lock().await.push(SentMessage {
            recipient: recipient.to_string(),
            text: text.to_string(),
            media_url: media_url.map(str::to_string),
            id: id.clone(),
        });
        Ok(SendReceipt { id: Some(id) })
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send_text(&self, recipient: &str, text: &str) -> Result<SendReceipt, ProcessorError> {
        self.record(recipient, text, None).await
    }

    async fn send_media(
        &self,
        recipient: &str,
        url: &str,
        caption: Option<&str>,
    ) -> Result<SendReceipt, ProcessorError> {
        self.record(recipient, caption.unwrap_or_default(), Some(url))
            .await
    }
}
