//! In-memory session the console drives.
//!
//! The local participant sits in slot 0 and is a boss with goons in slots 1
//! and 2. Slot 3 is unaffiliated. In activity mode slots 0 and 1 form one
//! team, 2 and 3 the other.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use huddle_core::moderation::ModerationHook;
use huddle_core::participant::{
    ConnectionId, Participant, ParticipantDirectory, ParticipantId, ParticipantSlot,
};
use huddle_core::render::Renderer;
use huddle_core::session::{AffiliationEntry, AffiliationTable, SessionMode, SessionOracle, TeamId};
use huddle_core::transport::{Transport, TransportError};
use huddle_core::{Collaborators, SpamVerdict};
use huddle_protocol::{GamerHandle, Platform};
use huddle_utils::locks::SyncRwLock;
use rustc_hash::FxHashMap;

const LOCAL_SLOT: ParticipantSlot = ParticipantSlot(0);

/// Participants, replicated tables and a loopback transport in one place.
pub struct DemoSession {
    local: Participant,
    remote: SyncRwLock<Vec<Participant>>,
    active: AtomicBool,
    mode: SyncRwLock<SessionMode>,
    entries: SyncRwLock<FxHashMap<ParticipantSlot, AffiliationEntry>>,
}

fn member(slot: u8, name: &str, handle: GamerHandle, address: Option<Ipv4Addr>) -> Participant {
    Participant {
        id: ParticipantId(u64::from(slot) + 1),
        slot: ParticipantSlot(slot),
        connection: ConnectionId(u32::from(slot)),
        name: name.to_string(),
        handle,
        address,
        trusted: false,
        friend: false,
    }
}

impl DemoSession {
    /// Creates the session with its default participants.
    #[must_use]
    pub fn new(local_name: &str) -> Self {
        let local = member(0, local_name, GamerHandle::pc(170_000_001), None);
        let mut rook = member(2, "Rook", GamerHandle::console(Platform::PlayStation), None);
        rook.friend = true;
        let remote = vec![
            member(
                1,
                "Vex",
                GamerHandle::pc(170_000_042).with_padding(1),
                Some(Ipv4Addr::new(192, 168, 1, 20)),
            ),
            rook,
            member(3, "Marlow", GamerHandle::console(Platform::Xbox), None),
        ];

        let mut entries = FxHashMap::default();
        entries.insert(
            LOCAL_SLOT,
            AffiliationEntry::new(None, [ParticipantSlot(1), ParticipantSlot(2)]),
        );
        entries.insert(ParticipantSlot(1), AffiliationEntry::new(Some(LOCAL_SLOT), []));
        entries.insert(ParticipantSlot(2), AffiliationEntry::new(Some(LOCAL_SLOT), []));
        entries.insert(ParticipantSlot(3), AffiliationEntry::default());

        Self {
            local,
            remote: SyncRwLock::new(remote),
            active: AtomicBool::new(true),
            mode: SyncRwLock::new(SessionMode::OpenWorld),
            entries: SyncRwLock::new(entries),
        }
    }

    /// Wires this session, a console renderer and a logging moderation hook
    /// into router collaborators.
    #[must_use]
    pub fn collaborators(self: &Arc<Self>) -> Collaborators {
        Collaborators {
            directory: self.clone(),
            session: self.clone(),
            affiliations: self.clone(),
            transport: self.clone(),
            moderation: Arc::new(LoggingModeration),
            renderer: Arc::new(ConsoleRenderer),
        }
    }

    /// Starts or ends the multiplayer session.
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Relaxed);
    }

    /// Switches between activity and open-world team rules.
    pub fn set_mode(&self, mode: SessionMode) {
        *self.mode.write() = mode;
    }

    /// Disconnects the participant in `slot` and clears its table row.
    pub fn leave(&self, slot: ParticipantSlot) -> Option<Participant> {
        let participant = {
            let mut remote = self.remote.write();
            let index = remote.iter().position(|p| p.slot == slot)?;
            remote.remove(index)
        };

        let mut entries = self.entries.write();
        entries.remove(&slot);
        for entry in entries.values_mut() {
            entry.goons.retain(|goon| *goon != slot);
            if entry.boss == Some(slot) {
                entry.boss = None;
            }
        }
        Some(participant)
    }
}

impl ParticipantDirectory for DemoSession {
    fn local(&self) -> Participant {
        self.local.clone()
    }

    fn connected(&self) -> Vec<Participant> {
        self.remote.read().clone()
    }

    fn by_slot(&self, slot: ParticipantSlot) -> Option<Participant> {
        self.remote.read().iter().find(|p| p.slot == slot).cloned()
    }

    fn by_connection(&self, connection: ConnectionId) -> Option<Participant> {
        self.remote
            .read()
            .iter()
            .find(|p| p.connection == connection)
            .cloned()
    }
}

impl SessionOracle for DemoSession {
    fn is_session_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    fn session_mode(&self) -> SessionMode {
        *self.mode.read()
    }

    fn team_of(&self, slot: ParticipantSlot) -> Option<TeamId> {
        match slot.0 {
            0 | 1 => Some(TeamId(0)),
            2 | 3 => Some(TeamId(1)),
            _ => None,
        }
    }
}

impl AffiliationTable for DemoSession {
    fn affiliation_entry(&self, slot: ParticipantSlot) -> Option<AffiliationEntry> {
        self.entries.read().get(&slot).cloned()
    }
}

impl Transport for DemoSession {
    fn send_bytes(&self, bytes: &[u8], connection: ConnectionId) -> Result<(), TransportError> {
        let remote = self.remote.read();
        let Some(recipient) = remote.iter().find(|p| p.connection == connection) else {
            return Err(TransportError::Closed(connection));
        };
        log::debug!("{} bytes -> {} on {connection}", bytes.len(), recipient.name);
        Ok(())
    }
}

/// Prints chat lines to the log.
struct ConsoleRenderer;

impl Renderer for ConsoleRenderer {
    fn show_message(&self, text: &str, sender_name: &str, team_only: bool) {
        let channel = if team_only { "TEAM" } else { "ALL" };
        log::info!(target: "chat", "[{channel}] {sender_name}: {text}");
    }
}

/// Logs spam verdicts.
struct LoggingModeration;

impl ModerationHook for LoggingModeration {
    fn on_spam_verdict(&self, participant: &Participant, verdict: SpamVerdict) {
        log::warn!(
            "Flagged {} (slot {}) for {verdict}",
            participant.name,
            participant.slot
        );
    }
}
