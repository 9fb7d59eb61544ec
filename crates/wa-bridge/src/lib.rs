//! WhatsApp Web bridge daemon client library.
//!
//! The bridge owns the WhatsApp protocol connection and exposes it over
//! HTTP. This crate supports:
//!
//! - Sending text and media messages to contacts and groups
//! - Receiving message, connection and credential events via SSE
//! - Restoring and removing the bridge session
//!
//! # Example
//!
//! ```no_run
//! use wa_bridge::{BridgeClient, BridgeConfig, BridgeEvent};
//!
//! # async fn example() -> Result<(), wa_bridge::BridgeError> {
//! let client = BridgeClient::connect(BridgeConfig::default()).await?;
//!
//! let result = client.send_text("5215512345678", "¡Hola!").await?;
//! println!("Sent message {}", result.id);
//!
//! use futures::StreamExt;
//! let mut events = wa_bridge::subscribe(&client)?;
//! while let Some(event) = events.next().await {
//!     match event {
//!         Ok(BridgeEvent::Messages(batch)) => println!("{} messages", batch.messages.len()),
//!         Ok(other) => println!("{:?}", other),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod sse;
pub mod types;

pub use client::BridgeClient;
pub use config::BridgeConfig;
pub use error::BridgeError;
pub use sse::{subscribe, EventStream, ReconnectConfig};
pub use types::*;
