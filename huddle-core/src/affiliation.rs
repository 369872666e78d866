//! Team affiliation between two participants.
//!
//! Activity sessions compare team ids directly. Open-world sessions walk the
//! boss/goon table, following at most one boss link. The table may change
//! between reads; any missing or inconsistent row resolves to "not a
//! teammate".

use crate::participant::ParticipantSlot;
use crate::session::{AffiliationTable, SessionMode, SessionOracle};

/// Everything affiliation needs to know about the session.
#[derive(Clone, Copy)]
pub struct AffiliationContext<'a> {
    /// Mode of the session being resolved.
    pub mode: SessionMode,
    /// Source of team ids for activity sessions.
    pub oracle: &'a dyn SessionOracle,
    /// Boss/goon table for open-world sessions.
    pub table: &'a dyn AffiliationTable,
}

impl<'a> AffiliationContext<'a> {
    /// Captures the current mode from the oracle.
    #[must_use]
    pub fn capture(oracle: &'a dyn SessionOracle, table: &'a dyn AffiliationTable) -> Self {
        Self {
            mode: oracle.session_mode(),
            oracle,
            table,
        }
    }
}

/// Whether `target_slot` is on `self_slot`'s team.
#[must_use]
pub fn same_team(
    self_slot: ParticipantSlot,
    target_slot: ParticipantSlot,
    ctx: &AffiliationContext<'_>,
) -> bool {
    match ctx.mode {
        SessionMode::Activity => {
            match (ctx.oracle.team_of(self_slot), ctx.oracle.team_of(target_slot)) {
                (Some(ours), Some(theirs)) => ours == theirs,
                _ => false,
            }
        }
        SessionMode::OpenWorld => same_organization(self_slot, target_slot, ctx.table),
    }
}

fn same_organization(
    self_slot: ParticipantSlot,
    target_slot: ParticipantSlot,
    table: &dyn AffiliationTable,
) -> bool {
    let Some(target) = table.affiliation_entry(target_slot) else {
        return false;
    };
    let Some(boss) = target.boss else {
        return false;
    };
    if boss == self_slot {
        return true;
    }

    // One hop: are we also working for the target's boss?
    let Some(boss_entry) = table.affiliation_entry(boss) else {
        return false;
    };
    boss_entry.goons.contains(&self_slot)
}
