//! Packet bodies and the [`Packet`] framing trait.

mod text_message;

pub use text_message::{ChatMessage, MAX_CONTENT_LEN, MESSAGE_ID_FIELD_LEN};

use huddle_utils::serial::{BitReader, BitWriter, WriteTo};

use crate::header::{read_header, write_header};
use crate::{MessageKind, WireError};

/// A packet body with a fixed [`MessageKind`].
pub trait Packet: WriteTo + Sized {
    /// Kind written into the header.
    const KIND: MessageKind;

    /// Reads the body that follows the header.
    fn read_body(reader: &mut BitReader<'_>) -> Result<Self, WireError>;

    /// Frames the packet: header, then body. Pure.
    fn encode(&self) -> Vec<u8> {
        let mut writer = BitWriter::with_capacity(64);
        write_header(&mut writer, Self::KIND);
        self.write(&mut writer);
        writer.into_bytes()
    }

    /// Parses a framed packet, rejecting other kinds.
    fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let mut reader = BitReader::new(bytes);
        let kind = read_header(&mut reader)?;
        if kind != Self::KIND {
            return Err(WireError::UnexpectedKind(kind.0));
        }
        Self::read_body(&mut reader)
    }
}
