//! Wire protocol for session text chat.
//!
//! Every packet starts with a [`header`] naming its [`MessageKind`], followed
//! by the packet body. Only text messages are modelled here.

pub mod error;
pub mod gamer_handle;
pub mod header;
pub mod packets;

pub use error::WireError;
pub use gamer_handle::{GamerHandle, Platform};
pub use header::MessageKind;
pub use packets::{ChatMessage, Packet};
