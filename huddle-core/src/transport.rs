//! Best-effort per-recipient packet transport.

use thiserror::Error;

use crate::participant::ConnectionId;

/// A failed send to a single recipient.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The connection is gone.
    #[error("connection {0} is closed")]
    Closed(ConnectionId),
    /// The send failed for another reason.
    #[error("send on connection {connection} failed: {reason}")]
    Failed {
        /// The connection the send was attempted on.
        connection: ConnectionId,
        /// Transport-specific description.
        reason: String,
    },
}

/// Sends encoded packets to individual connections.
///
/// Delivery is unordered and unacknowledged.
pub trait Transport: Send + Sync {
    /// Queues `bytes` for delivery on `connection`.
    fn send_bytes(&self, bytes: &[u8], connection: ConnectionId) -> Result<(), TransportError>;
}
