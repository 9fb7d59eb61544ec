//! Error types for brain operations.

use thiserror::Error;

/// Errors that can occur while a backend produces a reply.
#[derive(Debug, Error)]
pub enum BrainError {
    /// The backend is temporarily unavailable.
    #[error("brain unavailable: {0}")]
    Unavailable(String),

    /// Network failure talking to the backend.
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered but the message could not be processed.
    #[error("processing failed: {0}")]
    ProcessingFailed(String),

    /// The backend answered with a body we could not read.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The brain is misconfigured.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A timeout occurred during processing.
    #[error("processing timed out")]
    Timeout,

    /// The brain has been shut down.
    #[error("brain shut down")]
    ShutDown,
}

impl BrainError {
    /// Whether the failure is transient (network, timeout, unavailable).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BrainError::Unavailable(_) | BrainError::Network(_) | BrainError::Timeout
        )
    }
}
