//! Error types for message processing.

use std::time::Duration;

use brain_core::BrainError;
use database::DatabaseError;
use session_store::AuthError;
use thiserror::Error;
use wa_bridge::BridgeError;

/// Errors that can occur during message processing.
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// Error talking to the bridge.
    #[error("bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// Error from the brain during processing.
    #[error("brain error: {0}")]
    Brain(#[from] BrainError),

    /// Brain processing timed out.
    #[error("brain processing timed out after {0:?}")]
    Timeout(Duration),

    /// Reading or writing the store failed.
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// Session lifecycle error.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// Sending through a non-bridge transport failed.
    #[error("send failed: {0}")]
    Send(String),

    /// The event stream ended and reconnection gave up.
    #[error("event stream ended")]
    StreamEnded,
}
