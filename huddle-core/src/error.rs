//! Errors returned by the delivery router.

use huddle_protocol::WireError;
use thiserror::Error;

use crate::participant::{ConnectionId, ParticipantSlot};

/// Why a send or receive was rejected as a whole.
///
/// Per-recipient transport failures are not in here; they are reported in
/// [`crate::router::SendOutcome`] and never fail a send.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// No multiplayer session is running. Nothing was sent.
    #[error("no multiplayer session is active")]
    SessionNotActive,
    /// The text does not fit in a packet. Nothing was sent.
    #[error("message is {len} bytes, limit is {max}")]
    ContentTooLong {
        /// Text length in bytes.
        len: usize,
        /// Maximum length in bytes.
        max: usize,
    },
    /// The targeted slot holds no participant.
    #[error("no participant in slot {0}")]
    UnknownParticipant(ParticipantSlot),
    /// A packet arrived on a connection the directory does not know.
    #[error("no participant on connection {0}")]
    UnknownConnection(ConnectionId),
    /// Building or decoding the packet failed.
    #[error(transparent)]
    Wire(WireError),
}

impl From<WireError> for RelayError {
    fn from(err: WireError) -> Self {
        match err {
            WireError::ContentTooLong { len, max } => Self::ContentTooLong { len, max },
            other => Self::Wire(other),
        }
    }
}
