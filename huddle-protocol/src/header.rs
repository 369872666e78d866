//! Packet header: protocol magic followed by the message kind.

use huddle_utils::serial::{BitReader, BitWriter};

use crate::WireError;

/// Magic value opening every packet.
pub const PACKET_MAGIC: u16 = 0x3246;
/// Width of the magic field in bits.
const MAGIC_BITS: u32 = 14;

/// Identifies the packet body that follows the header.
///
/// Kinds above `0xFF` are sent in 16 bits behind a set extension flag,
/// everything else in 8 bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageKind(pub u16);

impl MessageKind {
    /// Session text chat.
    pub const TEXT_MESSAGE: Self = Self(0x24);

    const fn is_extended(self) -> bool {
        self.0 > 0xFF
    }
}

/// Writes the packet header for `kind`.
pub fn write_header(writer: &mut BitWriter, kind: MessageKind) {
    writer.write_bits(u64::from(PACKET_MAGIC), MAGIC_BITS);
    let extended = kind.is_extended();
    writer.write_bit(extended);
    writer.write_bits(u64::from(kind.0), if extended { 16 } else { 8 });
}

/// Reads a packet header and returns its kind.
pub fn read_header(reader: &mut BitReader<'_>) -> Result<MessageKind, WireError> {
    let magic = reader.read_bits(MAGIC_BITS)? as u16;
    if magic != PACKET_MAGIC {
        return Err(WireError::BadMagic(magic));
    }
    let extended = reader.read_bit()?;
    let kind = reader.read_bits(if extended { 16 } else { 8 })? as u16;
    Ok(MessageKind(kind))
}
