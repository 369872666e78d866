//! Session state owned by the game layer.
//!
//! Both traits here read replicated data that another layer writes at any
//! time. Values can change between two calls and nothing is locked.

use smallvec::SmallVec;

use crate::participant::ParticipantSlot;

/// Largest goon list a boss can have.
pub const MAX_GOONS: usize = 8;

/// How teams are structured in the current session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionMode {
    /// Team-structured session with explicit team ids.
    Activity,
    /// Free roam; teams come from the boss/goon table.
    OpenWorld,
}

/// Team identifier assigned in activity sessions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TeamId(pub i32);

/// One row of the boss/goon table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AffiliationEntry {
    /// The participant this one works for, `None` if unaffiliated or a boss.
    pub boss: Option<ParticipantSlot>,
    /// Participants working for this one.
    pub goons: SmallVec<[ParticipantSlot; MAX_GOONS]>,
}

impl AffiliationEntry {
    /// Builds an entry, keeping at most [`MAX_GOONS`] goons.
    #[must_use]
    pub fn new(
        boss: Option<ParticipantSlot>,
        goons: impl IntoIterator<Item = ParticipantSlot>,
    ) -> Self {
        Self {
            boss,
            goons: goons.into_iter().take(MAX_GOONS).collect(),
        }
    }
}

/// Session-level facts from the game layer.
pub trait SessionOracle: Send + Sync {
    /// Whether a multiplayer session is running.
    fn is_session_active(&self) -> bool;

    /// The mode of the running session.
    fn session_mode(&self) -> SessionMode;

    /// Team of the participant in `slot`, when one is assigned.
    fn team_of(&self, slot: ParticipantSlot) -> Option<TeamId>;
}

/// Read-only view of the replicated boss/goon table.
pub trait AffiliationTable: Send + Sync {
    /// The row for `slot`, or `None` when the slot is out of range or unreadable.
    fn affiliation_entry(&self, slot: ParticipantSlot) -> Option<AffiliationEntry>;
}
