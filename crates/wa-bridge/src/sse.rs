//! Server-Sent Events (SSE) client for bridge events.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::stream::Stream;
use reqwest_eventsource::{Event, EventSource, RequestBuilderExt};
use tracing::{debug, error, info, warn};

use crate::error::BridgeError;
use crate::types::BridgeEvent;
use crate::BridgeClient;

/// Backoff policy for resubscribing after the stream drops.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Maximum number of retries (None = infinite).
    pub max_retries: Option<u32>,
    /// Initial delay before first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Backoff multiplier for each retry.
    pub backoff_multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_retries: None,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl ReconnectConfig {
    /// Calculate delay for a given attempt number.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay_ms = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let delay = Duration::from_millis(delay_ms as u64);
        delay.min(self.max_delay)
    }

    /// Check if we should retry after the given number of attempts.
    pub fn should_retry(&self, attempts: u32) -> bool {
        self.max_retries.map_or(true, |max| attempts < max)
    }
}

/// A stream of decoded bridge events.
///
/// Errors are yielded to the caller, which decides whether to resubscribe.
pub struct EventStream {
    event_source: EventSource,
}

impl EventStream {
    /// Open the SSE connection for a client.
    pub fn new(client: &BridgeClient) -> Result<Self, BridgeError> {
        let url = client.config().events_url();
        info!("Creating SSE connection to {}", url);

        // Long-lived stream, so no request timeout
        let sse_client = reqwest::Client::builder().build()?;

        let event_source = sse_client
            .get(&url)
            .eventsource()
            .map_err(|e| BridgeError::Sse(e.to_string()))?;

        Ok(Self { event_source })
    }

    /// Stop the underlying connection.
    pub fn close(&mut self) {
        self.event_source.close();
    }
}

impl Stream for EventStream {
    type Item = Result<BridgeEvent, BridgeError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.event_source).poll_next(cx) {
                Poll::Ready(Some(Ok(Event::Open))) => {
                    debug!("SSE connection opened");
                    continue;
                }
                Poll::Ready(Some(Ok(Event::Message(msg)))) => {
                    match BridgeEvent::parse(&msg.event, &msg.data) {
                        Ok(Some(event)) => return Poll::Ready(Some(Ok(event))),
                        Ok(None) => {
                            debug!("Ignoring SSE event type: {}", msg.event);
                            continue;
                        }
                        Err(e) => {
                            warn!("Failed to parse {} event: {}", msg.event, e);
                            debug!("Raw data: {}", msg.data);
                            continue;
                        }
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    error!("SSE error: {}", e);
                    return Poll::Ready(Some(Err(BridgeError::Sse(e.to_string()))));
                }
                Poll::Ready(None) => {
                    info!("SSE stream ended");
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Subscribe to bridge events.
pub fn subscribe(client: &BridgeClient) -> Result<EventStream, BridgeError> {
    EventStream::new(client)
}
