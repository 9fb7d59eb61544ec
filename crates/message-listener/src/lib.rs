//! Bridge event listener and delivery pipeline for the WhatsApp relay bot.
//!
//! This crate turns bridge events into replies:
//!
//! - [`classify`] - normalizes provider messages for logging and answering
//! - [`DedupSet`] - trailing-window de-duplication of message ids
//! - [`HandoffTracker`] - persisted human handoff state and its expiry
//! - [`Pipeline`] - persist, forward to a [`brain_core::Brain`], validate
//!   against the catalog, reply and capture orders
//! - [`MessageProcessor`] - the SSE event loop with resubscription and
//!   graceful shutdown
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use database::Database;
//! use message_listener::{MessageProcessor, Pipeline, PipelineConfig, SessionContext};
//! use mock_brain::EchoBrain;
//! use session_store::{DatabaseSessionStore, RemoteAuth};
//! use wa_bridge::{BridgeClient, BridgeConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("sqlite:relay.db?mode=rwc").await?;
//! db.migrate().await?;
//!
//! let client = BridgeClient::connect(BridgeConfig::default()).await?;
//! let pipeline = Arc::new(Pipeline::new(
//!     db.clone(),
//!     Arc::new(EchoBrain::new()),
//!     Arc::new(client.clone()),
//!     Arc::new(SessionContext::new()),
//!     PipelineConfig::default(),
//! ));
//! let auth = Arc::new(RemoteAuth::new("tienda-centro", Arc::new(DatabaseSessionStore::new(db)))?);
//!
//! MessageProcessor::new(client, pipeline, auth)
//!     .run_with_shutdown(async {})
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod classifier;
pub mod context;
pub mod dedup;
pub mod error;
pub mod handoff;
pub mod notify;
pub mod pipeline;
pub mod processor;
pub mod sender;

pub use catalog::{format_summary, is_affirmation, parse_product_reply, CatalogOutcome, ProductReply};
pub use classifier::{classify, Classified};
pub use context::{SessionContext, PENDING_PRODUCT_WINDOW};
pub use dedup::{DedupSet, DEDUP_WINDOW};
pub use error::ProcessorError;
pub use handoff::{is_handoff_request, HandoffDecision, HandoffTracker, HANDOFF_EXPIRY};
pub use notify::OperatorNotifier;
pub use pipeline::{
    Pipeline, PipelineConfig, ProcessResult, SweepReport, APOLOGY_TEXT, HANDOFF_ACK_TEXT,
    SWEEP_INTERVAL,
};
pub use processor::MessageProcessor;
pub use sender::{MessageSender, RecordingSender, SendReceipt, SentMessage};

// Re-export the bridge types callers need to drive the processor
pub use wa_bridge::{BridgeEvent, ProviderMessage, ReconnectConfig};

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
