//! Session text chat packet.

use huddle_utils::serial::{BitError, BitReader, BitWriter, ReadFrom, WriteTo};
use uuid::Uuid;

use crate::{GamerHandle, MessageKind, Packet, WireError};

/// Largest message content in bytes.
pub const MAX_CONTENT_LEN: usize = 256;
/// Capacity of the message id field, terminator included.
pub const MESSAGE_ID_FIELD_LEN: usize = 40;
/// Length of a hyphenated UUID.
const UUID_TEXT_LEN: usize = 36;

/// A chat line relayed between session participants.
///
/// Body layout after the header:
/// content string, message id string, sender gamer handle, 1-bit team flag.
/// Immutable once built; construction enforces the content limits so every
/// value can be encoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
    sender_handle: GamerHandle,
    content: String,
    message_id: Uuid,
    team_only: bool,
}

impl ChatMessage {
    /// Builds a message with a fresh random id.
    pub fn new(
        sender_handle: GamerHandle,
        content: impl Into<String>,
        team_only: bool,
    ) -> Result<Self, WireError> {
        Self::with_id(sender_handle, content, Uuid::new_v4(), team_only)
    }

    /// Builds a message with an explicit id.
    pub fn with_id(
        sender_handle: GamerHandle,
        content: impl Into<String>,
        message_id: Uuid,
        team_only: bool,
    ) -> Result<Self, WireError> {
        let content = content.into();
        if content.len() > MAX_CONTENT_LEN {
            return Err(WireError::ContentTooLong {
                len: content.len(),
                max: MAX_CONTENT_LEN,
            });
        }
        if content.as_bytes().contains(&0) {
            return Err(WireError::InteriorNul);
        }
        Ok(Self {
            sender_handle,
            content,
            message_id,
            team_only,
        })
    }

    /// Who sent the message.
    #[must_use]
    pub const fn sender_handle(&self) -> &GamerHandle {
        &self.sender_handle
    }

    /// The message text.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Unique id of this message.
    #[must_use]
    pub const fn message_id(&self) -> Uuid {
        self.message_id
    }

    /// Whether only the sender's team should see the message.
    #[must_use]
    pub const fn team_only(&self) -> bool {
        self.team_only
    }
}

impl WriteTo for ChatMessage {
    fn write(&self, writer: &mut BitWriter) {
        writer.write_string(self.content.as_bytes());
        let mut id = [0u8; UUID_TEXT_LEN];
        writer.write_string(self.message_id.hyphenated().encode_lower(&mut id).as_bytes());
        self.sender_handle.write(writer);
        self.team_only.write(writer);
    }
}

impl Packet for ChatMessage {
    const KIND: MessageKind = MessageKind::TEXT_MESSAGE;

    fn read_body(reader: &mut BitReader<'_>) -> Result<Self, WireError> {
        let content = match reader.read_string(MAX_CONTENT_LEN) {
            Ok(bytes) => String::from_utf8(bytes).map_err(|_| WireError::InvalidUtf8)?,
            Err(BitError::StringTooLong { len, max }) => {
                return Err(WireError::ContentTooLong { len, max });
            }
            Err(err) => return Err(err.into()),
        };

        let id = reader.read_string(MESSAGE_ID_FIELD_LEN - 1)?;
        let message_id = parse_message_id(&id)?;

        let sender_handle = GamerHandle::read(reader)?;
        let team_only = bool::read(reader)?;

        Ok(Self {
            sender_handle,
            content,
            message_id,
            team_only,
        })
    }
}

/// Accepts only the canonical lowercase hyphenated form.
fn parse_message_id(bytes: &[u8]) -> Result<Uuid, WireError> {
    if bytes.len() != UUID_TEXT_LEN || bytes.iter().any(u8::is_ascii_uppercase) {
        return Err(WireError::InvalidMessageId);
    }
    let text = std::str::from_utf8(bytes).map_err(|_| WireError::InvalidMessageId)?;
    Uuid::parse_str(text).map_err(|_| WireError::InvalidMessageId)
}
