//! Delivery router tests against in-memory collaborators.
//!
//! The session has the local participant in slot 1 as a boss with goons in
//! slots 2 and 3, and an unaffiliated participant in slot 4. Each remote
//! participant's connection id equals its slot.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use huddle_core::moderation::ModerationHook;
use huddle_core::participant::{
    ConnectionId, Participant, ParticipantDirectory, ParticipantId, ParticipantSlot,
};
use huddle_core::render::Renderer;
use huddle_core::session::{AffiliationEntry, AffiliationTable, SessionMode, SessionOracle, TeamId};
use huddle_core::transport::{Transport, TransportError};
use huddle_core::{
    Collaborators, DeliveryRouter, Dispatch, JobPump, PrivilegedScope, RelayConfig, RelayError,
    SendRequest, SpamRuleSet, SpamVerdict, job_queue,
};
use huddle_protocol::{ChatMessage, GamerHandle, Packet, WireError};
use huddle_utils::locks::SyncMutex;
use rustc_hash::{FxHashMap, FxHashSet};

const P1: ParticipantSlot = ParticipantSlot(1);
const P2: ParticipantSlot = ParticipantSlot(2);
const P3: ParticipantSlot = ParticipantSlot(3);
const P4: ParticipantSlot = ParticipantSlot(4);

const LONG: &str = "this message is definitely longer than the limit";

fn participant(slot: ParticipantSlot, name: &str) -> Participant {
    Participant {
        id: ParticipantId(100 + u64::from(slot.0)),
        slot,
        connection: ConnectionId(u32::from(slot.0)),
        name: name.to_string(),
        handle: GamerHandle::pc(1_000 + i64::from(slot.0)),
        address: None,
        trusted: false,
        friend: false,
    }
}

struct FakeDirectory {
    local: Participant,
    remote: Vec<Participant>,
}

impl ParticipantDirectory for FakeDirectory {
    fn local(&self) -> Participant {
        self.local.clone()
    }

    fn connected(&self) -> Vec<Participant> {
        self.remote.clone()
    }

    fn by_slot(&self, slot: ParticipantSlot) -> Option<Participant> {
        self.remote.iter().find(|p| p.slot == slot).cloned()
    }

    fn by_connection(&self, connection: ConnectionId) -> Option<Participant> {
        self.remote.iter().find(|p| p.connection == connection).cloned()
    }
}

struct FakeSession {
    active: AtomicBool,
    mode: SyncMutex<SessionMode>,
    teams: SyncMutex<FxHashMap<ParticipantSlot, TeamId>>,
    entries: SyncMutex<FxHashMap<ParticipantSlot, AffiliationEntry>>,
}

impl FakeSession {
    fn organization() -> Self {
        let mut entries = FxHashMap::default();
        entries.insert(P1, AffiliationEntry::new(None, [P2, P3]));
        entries.insert(P2, AffiliationEntry::new(Some(P1), []));
        entries.insert(P3, AffiliationEntry::new(Some(P1), []));
        entries.insert(P4, AffiliationEntry::new(None, []));
        Self {
            active: AtomicBool::new(true),
            mode: SyncMutex::new(SessionMode::OpenWorld),
            teams: SyncMutex::new(FxHashMap::default()),
            entries: SyncMutex::new(entries),
        }
    }
}

impl SessionOracle for FakeSession {
    fn is_session_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn session_mode(&self) -> SessionMode {
        *self.mode.lock()
    }

    fn team_of(&self, slot: ParticipantSlot) -> Option<TeamId> {
        self.teams.lock().get(&slot).copied()
    }
}

impl AffiliationTable for FakeSession {
    fn affiliation_entry(&self, slot: ParticipantSlot) -> Option<AffiliationEntry> {
        self.entries.lock().get(&slot).cloned()
    }
}

#[derive(Default)]
struct RecordingTransport {
    sent: SyncMutex<Vec<(ConnectionId, Vec<u8>)>>,
    closed: SyncMutex<FxHashSet<ConnectionId>>,
}

impl RecordingTransport {
    fn connections(&self) -> Vec<ConnectionId> {
        self.sent.lock().iter().map(|(connection, _)| *connection).collect()
    }
}

impl Transport for RecordingTransport {
    fn send_bytes(&self, bytes: &[u8], connection: ConnectionId) -> Result<(), TransportError> {
        if self.closed.lock().contains(&connection) {
            return Err(TransportError::Closed(connection));
        }
        self.sent.lock().push((connection, bytes.to_vec()));
        Ok(())
    }
}

#[derive(Default)]
struct RecordingModeration {
    verdicts: SyncMutex<Vec<(ParticipantSlot, SpamVerdict)>>,
}

impl ModerationHook for RecordingModeration {
    fn on_spam_verdict(&self, participant: &Participant, verdict: SpamVerdict) {
        self.verdicts.lock().push((participant.slot, verdict));
    }
}

#[derive(Default)]
struct RecordingRenderer {
    lines: SyncMutex<Vec<(String, String, bool)>>,
}

impl Renderer for RecordingRenderer {
    fn show_message(&self, text: &str, sender_name: &str, team_only: bool) {
        self.lines
            .lock()
            .push((text.to_string(), sender_name.to_string(), team_only));
    }
}

struct Harness {
    router: DeliveryRouter,
    pump: JobPump,
    session: Arc<FakeSession>,
    transport: Arc<RecordingTransport>,
    moderation: Arc<RecordingModeration>,
    renderer: Arc<RecordingRenderer>,
}

fn quiet_config() -> RelayConfig {
    let mut config = RelayConfig::default();
    config.log.log_chat_messages = false;
    config
}

fn harness_with(config: &RelayConfig) -> Harness {
    let directory = Arc::new(FakeDirectory {
        local: participant(P1, "Local"),
        remote: vec![
            participant(P2, "Goon A"),
            participant(P3, "Goon B"),
            participant(P4, "Loner"),
        ],
    });
    let session = Arc::new(FakeSession::organization());
    let transport = Arc::new(RecordingTransport::default());
    let moderation = Arc::new(RecordingModeration::default());
    let renderer = Arc::new(RecordingRenderer::default());

    let (guard, pump) = job_queue(config.job_queue_capacity);
    let collaborators = Collaborators {
        directory,
        session: session.clone(),
        affiliations: session.clone(),
        transport: transport.clone(),
        moderation: moderation.clone(),
        renderer: renderer.clone(),
    };

    Harness {
        router: DeliveryRouter::new(collaborators, guard, config),
        pump,
        session,
        transport,
        moderation,
        renderer,
    }
}

fn harness() -> Harness {
    harness_with(&quiet_config())
}

fn packet_from(slot: ParticipantSlot, text: &str) -> Vec<u8> {
    let handle = participant(slot, "").handle;
    ChatMessage::new(handle, text, false).unwrap().encode()
}

#[test]
fn team_send_from_boss_reaches_goons_only() {
    let h = harness();

    let outcome = h
        .router
        .send(SendRequest::new("regroup at the office").team_only(true))
        .unwrap();

    assert_eq!(outcome.delivered, vec![P2, P3]);
    assert!(outcome.failed.is_empty());
    assert_eq!(
        h.transport.connections(),
        vec![ConnectionId(2), ConnectionId(3)]
    );

    assert_eq!(outcome.render, Some(Dispatch::Queued));
    assert!(h.renderer.lines.lock().is_empty());
    assert_eq!(h.pump.run_pending(), 1);
    assert_eq!(
        *h.renderer.lines.lock(),
        vec![("regroup at the office".to_string(), "Local".to_string(), true)]
    );
}

#[test]
fn global_send_reaches_everyone() {
    let h = harness();
    let outcome = h.router.send(SendRequest::new("gg")).unwrap();
    assert_eq!(outcome.delivered, vec![P2, P3, P4]);
    assert_eq!(outcome.verdict, SpamVerdict::NotSpam);
}

#[test]
fn targeted_send_ignores_team_flag() {
    let h = harness();
    let outcome = h
        .router
        .send(SendRequest::new("psst").to(P4).team_only(true))
        .unwrap();
    assert_eq!(outcome.delivered, vec![P4]);
    assert_eq!(h.transport.connections(), vec![ConnectionId(4)]);
}

#[test]
fn activity_team_send_follows_team_ids() {
    let h = harness();
    *h.session.mode.lock() = SessionMode::Activity;
    {
        let mut teams = h.session.teams.lock();
        teams.insert(P1, TeamId(0));
        teams.insert(P2, TeamId(0));
        teams.insert(P3, TeamId(1));
    }

    let outcome = h
        .router
        .send(SendRequest::new("push left").team_only(true))
        .unwrap();
    assert_eq!(outcome.delivered, vec![P2]);
}

#[test]
fn unknown_target_sends_nothing() {
    let h = harness();
    let err = h
        .router
        .send(SendRequest::new("hello?").to(ParticipantSlot(9)))
        .unwrap_err();
    assert_eq!(err, RelayError::UnknownParticipant(ParticipantSlot(9)));
    assert!(h.transport.connections().is_empty());
}

#[test]
fn inactive_session_rejects_without_side_effects() {
    let h = harness();
    h.session.active.store(false, Ordering::SeqCst);

    let err = h.router.send(SendRequest::new("anyone?")).unwrap_err();
    assert_eq!(err, RelayError::SessionNotActive);
    assert!(h.transport.connections().is_empty());
    assert_eq!(h.pump.pending(), 0);
}

#[test]
fn oversized_text_is_rejected_before_classification() {
    let h = harness();
    let text = "a".repeat(257);

    let err = h.router.send(SendRequest::new(text)).unwrap_err();
    assert_eq!(err, RelayError::ContentTooLong { len: 257, max: 256 });
    assert!(h.transport.connections().is_empty());
    assert_eq!(
        h.router.classifier().last_message_time(participant(P1, "").id),
        None
    );
}

#[test]
fn one_failing_recipient_does_not_stop_the_rest() {
    let h = harness();
    h.transport.closed.lock().insert(ConnectionId(3));

    let outcome = h.router.send(SendRequest::new("still here")).unwrap();
    assert_eq!(outcome.delivered, vec![P2, P4]);
    assert_eq!(
        outcome.failed,
        vec![(P3, TransportError::Closed(ConnectionId(3)))]
    );
}

#[test]
fn spam_is_reported_but_still_delivered() {
    let h = harness();

    let outcome = h.router.send(SendRequest::new("cheap GTACASH here")).unwrap();
    assert_eq!(outcome.verdict, SpamVerdict::StaticMatch);
    assert_eq!(outcome.delivered, vec![P2, P3, P4]);
    assert_eq!(
        *h.moderation.verdicts.lock(),
        vec![(P1, SpamVerdict::StaticMatch)]
    );
}

#[test]
fn replaced_rules_apply_to_later_sends() {
    let h = harness();
    let before = h.router.send(SendRequest::new("rally point")).unwrap();
    assert_eq!(before.verdict, SpamVerdict::NotSpam);

    h.router.set_rules(SpamRuleSet::new(["RALLY"]));
    let after = h.router.send(SendRequest::new("rally point")).unwrap();
    assert_eq!(after.verdict, SpamVerdict::StaticMatch);
    assert_eq!(after.delivered, vec![P2, P3, P4]);
    assert_eq!(
        *h.moderation.verdicts.lock(),
        vec![(P1, SpamVerdict::StaticMatch)]
    );
}

#[test]
fn clean_messages_do_not_reach_moderation() {
    let h = harness();
    h.router.send(SendRequest::new("good game")).unwrap();
    assert!(h.moderation.verdicts.lock().is_empty());
}

#[test]
fn sent_packets_decode_to_the_sent_message() {
    let h = harness();
    let outcome = h
        .router
        .send(SendRequest::new("héllo").to(P2).team_only(true))
        .unwrap();

    let sent = h.transport.sent.lock();
    let decoded = ChatMessage::decode(&sent[0].1).unwrap();
    assert_eq!(decoded.content(), "héllo");
    assert_eq!(decoded.message_id(), outcome.message_id);
    assert_eq!(*decoded.sender_handle(), participant(P1, "").handle);
    assert!(decoded.team_only());
}

#[test]
fn each_send_gets_a_new_id() {
    let h = harness();
    let first = h.router.send(SendRequest::new("one")).unwrap();
    let second = h.router.send(SendRequest::new("two")).unwrap();
    assert_ne!(first.message_id, second.message_id);
}

#[test]
fn render_can_be_skipped() {
    let h = harness();
    let outcome = h
        .router
        .send(SendRequest::new("quiet").render_locally(false))
        .unwrap();
    assert_eq!(outcome.render, None);
    assert_eq!(h.pump.pending(), 0);
}

#[test]
fn privileged_callers_render_immediately() {
    let h = harness();
    let _scope = PrivilegedScope::enter();

    let outcome = h.router.send(SendRequest::new("from the main context")).unwrap();
    assert_eq!(outcome.render, Some(Dispatch::Immediate));
    assert_eq!(h.renderer.lines.lock().len(), 1);
    assert_eq!(h.pump.pending(), 0);
}

#[test]
fn inbound_message_is_attributed_and_rendered() {
    let h = harness();

    let inbound = h
        .router
        .receive(ConnectionId(2), &packet_from(P2, "nice car"))
        .unwrap();
    assert_eq!(inbound.sender.slot, P2);
    assert_eq!(inbound.message.content(), "nice car");
    assert_eq!(inbound.verdict, SpamVerdict::NotSpam);
    assert_eq!(inbound.render, Some(Dispatch::Queued));

    h.pump.run_pending();
    assert_eq!(
        *h.renderer.lines.lock(),
        vec![("nice car".to_string(), "Goon A".to_string(), false)]
    );
}

#[test]
fn inbound_spam_is_reported_and_hidden() {
    let h = harness();

    let inbound = h
        .router
        .receive(ConnectionId(4), &packet_from(P4, "visit gtacash"))
        .unwrap();
    assert_eq!(inbound.verdict, SpamVerdict::StaticMatch);
    assert_eq!(inbound.render, None);
    assert_eq!(
        *h.moderation.verdicts.lock(),
        vec![(P4, SpamVerdict::StaticMatch)]
    );
}

#[test]
fn inbound_spam_renders_when_configured() {
    let mut config = quiet_config();
    config.render_spam = true;
    let h = harness_with(&config);

    let inbound = h
        .router
        .receive(ConnectionId(4), &packet_from(P4, "visit gtacash"))
        .unwrap();
    assert_eq!(inbound.render, Some(Dispatch::Queued));
}

#[test]
fn inbound_from_unknown_connection_is_rejected() {
    let h = harness();
    let err = h
        .router
        .receive(ConnectionId(9), &packet_from(P2, "hi"))
        .unwrap_err();
    assert_eq!(err, RelayError::UnknownConnection(ConnectionId(9)));
}

#[test]
fn malformed_inbound_packets_are_wire_errors() {
    let h = harness();
    assert_eq!(
        h.router.receive(ConnectionId(2), &[]).unwrap_err(),
        RelayError::Wire(WireError::Truncated)
    );
}

#[test]
fn timer_state_follows_the_connection() {
    let h = harness();
    let goon = participant(P2, "Goon A");

    h.router.participant_joined(&goon);
    assert_eq!(h.router.classifier().tracked(), 1);

    h.router
        .receive(ConnectionId(2), &packet_from(P2, "hi"))
        .unwrap();
    let burst = h
        .router
        .receive(ConnectionId(2), &packet_from(P2, LONG))
        .unwrap();
    assert_eq!(burst.verdict, SpamVerdict::TimerMatch);

    h.router.participant_left(goon.id);
    assert_eq!(h.router.classifier().tracked(), 0);

    let after_rejoin = h
        .router
        .receive(ConnectionId(2), &packet_from(P2, LONG))
        .unwrap();
    assert_eq!(after_rejoin.verdict, SpamVerdict::NotSpam);
}

#[test]
fn messages_are_written_to_the_chat_and_spam_logs() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = RelayConfig::default();
    config.log.chat_log_path = dir.path().join("chat.log");
    config.log.spam_log_path = dir.path().join("spam.log");
    let h = harness_with(&config);

    h.router.send(SendRequest::new("hello all")).unwrap();
    h.router
        .receive(ConnectionId(4), &packet_from(P4, "visit gtacash"))
        .unwrap();

    let chat = std::fs::read_to_string(&config.log.chat_log_path).unwrap();
    assert!(chat.contains("] Local (1001) <UNKNOWN> [ALL]: hello all"));
    let spam = std::fs::read_to_string(&config.log.spam_log_path).unwrap();
    assert!(spam.starts_with("(Static Detection) ["));
    assert!(spam.contains("Loner (1004)"));
}

#[test]
fn log_write_failures_do_not_fail_sends() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = RelayConfig::default();
    // A directory where the file should be.
    config.log.chat_log_path = dir.path().to_path_buf();
    config.log.spam_log_path = dir.path().to_path_buf();
    let h = harness_with(&config);

    let outcome = h.router.send(SendRequest::new("still sent")).unwrap();
    assert_eq!(outcome.delivered, vec![P2, P3, P4]);
}

#[test]
fn concurrent_sends_all_deliver() {
    let h = Arc::new(harness());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let h = h.clone();
            std::thread::spawn(move || {
                h.router
                    .send(SendRequest::new(format!("msg {i}")).render_locally(false))
                    .unwrap()
                    .delivered
                    .len()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 3);
    }
    assert_eq!(h.transport.connections().len(), 12);
}
