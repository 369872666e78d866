//! Errors raised while building or decoding packets.

use huddle_utils::serial::BitError;
use thiserror::Error;

/// An error that can occur while encoding or decoding a packet.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// Message content is larger than the text field allows.
    #[error("message content is {len} bytes, limit is {max}")]
    ContentTooLong {
        /// Content length in bytes.
        len: usize,
        /// Maximum content length in bytes.
        max: usize,
    },
    /// Message content contains a NUL byte, which terminates strings on the wire.
    #[error("message content contains a NUL byte")]
    InteriorNul,
    /// The buffer ended before the packet was complete.
    #[error("packet truncated")]
    Truncated,
    /// The gamer handle carries a platform tag we do not know.
    #[error("unknown platform tag {0}")]
    UnknownPlatform(u8),
    /// The packet does not start with the protocol magic.
    #[error("bad packet magic {0:#06x}")]
    BadMagic(u16),
    /// The packet is not of the kind the caller asked for.
    #[error("unexpected message kind {0:#x}")]
    UnexpectedKind(u16),
    /// The text field is not valid UTF-8.
    #[error("message content is not valid UTF-8")]
    InvalidUtf8,
    /// The message id field is not a canonical UUID.
    #[error("message id is not a canonical UUID")]
    InvalidMessageId,
    /// A string field declared more bytes than it may hold.
    #[error("string field of {len} bytes exceeds {max}")]
    StringTooLong {
        /// Declared length.
        len: usize,
        /// Field capacity.
        max: usize,
    },
    /// A string field was not properly terminated.
    #[error("malformed string field")]
    MalformedString,
}

impl From<BitError> for WireError {
    fn from(err: BitError) -> Self {
        match err {
            BitError::Exhausted { .. } => Self::Truncated,
            BitError::StringTooLong { len, max } => Self::StringTooLong { len, max },
            BitError::MalformedString => Self::MalformedString,
        }
    }
}
