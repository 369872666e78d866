//! Participants as seen through the external participant directory.

use std::fmt;
use std::net::Ipv4Addr;

use huddle_protocol::GamerHandle;
use serde::{Deserialize, Serialize};

/// Index of a participant in the session's replicated tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantSlot(pub u8);

impl fmt::Display for ParticipantSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity that stays the same for the whole life of one connection.
///
/// Slots are recycled when participants leave, ids are not.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantId(pub u64);

/// Handle of a participant's individual transport connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub u32);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Snapshot of a participant as reported by the directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Participant {
    /// Stable identity for this connection.
    pub id: ParticipantId,
    /// Slot in the session tables.
    pub slot: ParticipantSlot,
    /// Connection messages to this participant go through.
    pub connection: ConnectionId,
    /// Display name.
    pub name: String,
    /// Wire identity.
    pub handle: GamerHandle,
    /// Remote address, when the directory knows it.
    pub address: Option<Ipv4Addr>,
    /// Marked trusted by the local user.
    pub trusted: bool,
    /// On the local user's friend list.
    pub friend: bool,
}

/// Lookup service for the participants of the current session.
///
/// Implementations own the participant data; the relay only reads it.
pub trait ParticipantDirectory: Send + Sync {
    /// The local participant.
    fn local(&self) -> Participant;

    /// Every connected remote participant.
    fn connected(&self) -> Vec<Participant>;

    /// The participant in `slot`, if any.
    fn by_slot(&self, slot: ParticipantSlot) -> Option<Participant>;

    /// The participant behind `connection`, if any.
    fn by_connection(&self, connection: ConnectionId) -> Option<Participant>;
}
