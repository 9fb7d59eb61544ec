//! Wire types exchanged with the bridge daemon.

pub mod events;
pub mod jid;
pub mod message;
pub mod send;

pub use events::*;
pub use jid::*;
pub use message::*;
pub use send::*;
