//! Scripted brains - canned replies and forced failures.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use brain_core::{async_trait, Brain, BrainError, InboundMessage, OutboundMessage};
use tokio::sync::Mutex;

/// A brain that answers from a script and records every message it sees.
///
/// Replies are consumed in order; once the script runs out the last reply
/// is repeated.
#[derive(Debug, Default)]
pub struct ScriptedBrain {
    replies: Mutex<VecDeque<String>>,
    last: Mutex<Option<String>>,
    received: Mutex<Vec<InboundMessage>>,
}

impl ScriptedBrain {
    /// Create a brain that always answers `reply`.
    pub fn always(reply: impl Into<String>) -> Self {
        Self::with_replies([reply.into()])
    }

    /// Create a brain that answers with each reply in turn.
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Number of messages processed so far.
    pub async fn call_count(&self) -> usize {
        self.received.lock().await.len()
    }

    /// Messages received so far, in order.
    pub async fn received(&self) -> Vec<InboundMessage> {
        self.received.lock().await.clone()
    }
}

#[async_trait]
impl Brain for ScriptedBrain {
    async fn process(&self, message: InboundMessage) -> Result<OutboundMessage, BrainError> {
        self.received.lock().await.push(message.clone());

        let mut last = self.last.lock().await;
        let reply = match self.replies.lock().await.pop_front() {
            Some(reply) => {
                *last = Some(reply.clone());
                reply
            }
            None => last
                .clone()
                .ok_or_else(|| BrainError::ProcessingFailed("script is empty".to_string()))?,
        };

        Ok(OutboundMessage::reply_to(&message, reply))
    }

    fn name(&self) -> &str {
        "ScriptedBrain"
    }
}

/// A brain that fails every request with a network error.
#[derive(Debug, Default)]
pub struct FailingBrain {
    calls: AtomicUsize,
}

impl FailingBrain {
    /// Create a new failing brain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests attempted.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Brain for FailingBrain {
    async fn process(&self, _message: InboundMessage) -> Result<OutboundMessage, BrainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(BrainError::Network("connection refused".to_string()))
    }

    fn name(&self) -> &str {
        "FailingBrain"
    }
}
