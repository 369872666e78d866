//! Delivery router: classifies, filters and dispatches chat messages.

use std::sync::Arc;
use std::time::Instant;

use huddle_protocol::{ChatMessage, Packet};
use huddle_utils::locks::SyncRwLock;
use uuid::Uuid;

use crate::affiliation::{AffiliationContext, same_team};
use crate::chat_log::ChatLog;
use crate::config::RelayConfig;
use crate::context::{ContextGuard, Dispatch};
use crate::error::RelayError;
use crate::moderation::ModerationHook;
use crate::participant::{
    ConnectionId, Participant, ParticipantDirectory, ParticipantId, ParticipantSlot,
};
use crate::render::Renderer;
use crate::session::{AffiliationTable, SessionOracle};
use crate::spam::{SpamClassifier, SpamRuleSet, SpamVerdict};
use crate::transport::{Transport, TransportError};

/// External services the router talks to.
#[derive(Clone)]
pub struct Collaborators {
    /// Participant lookup.
    pub directory: Arc<dyn ParticipantDirectory>,
    /// Session state and activity team ids.
    pub session: Arc<dyn SessionOracle>,
    /// Replicated boss/goon table.
    pub affiliations: Arc<dyn AffiliationTable>,
    /// Per-connection packet sender.
    pub transport: Arc<dyn Transport>,
    /// Told about every spam verdict.
    pub moderation: Arc<dyn ModerationHook>,
    /// Chat feed; only called through the context guard.
    pub renderer: Arc<dyn Renderer>,
}

/// A message the local participant wants to send.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendRequest {
    /// Message text.
    pub text: String,
    /// Send to this participant only.
    pub target: Option<ParticipantSlot>,
    /// Restrict an untargeted send to the sender's team.
    pub team_only: bool,
    /// Also show the message in the local chat feed.
    pub render_locally: bool,
}

impl SendRequest {
    /// A message to everyone, rendered locally.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            target: None,
            team_only: false,
            render_locally: true,
        }
    }

    /// Sends to `slot` only.
    #[must_use]
    pub fn to(mut self, slot: ParticipantSlot) -> Self {
        self.target = Some(slot);
        self
    }

    /// Marks the message team-only.
    #[must_use]
    pub fn team_only(mut self, team_only: bool) -> Self {
        self.team_only = team_only;
        self
    }

    /// Whether to show the message locally.
    #[must_use]
    pub fn render_locally(mut self, render_locally: bool) -> Self {
        self.render_locally = render_locally;
        self
    }
}

/// What happened to a sent message.
#[derive(Debug)]
pub struct SendOutcome {
    /// Id carried by the packet.
    pub message_id: Uuid,
    /// Classification of the text.
    pub verdict: SpamVerdict,
    /// Recipients whose transport accepted the packet.
    pub delivered: Vec<ParticipantSlot>,
    /// Recipients whose transport failed.
    pub failed: Vec<(ParticipantSlot, TransportError)>,
    /// How the local render was dispatched, if one was requested.
    pub render: Option<Dispatch>,
}

/// A decoded message from a remote participant.
#[derive(Debug)]
pub struct InboundMessage {
    /// Who the directory says sent it.
    pub sender: Participant,
    /// The decoded packet.
    pub message: ChatMessage,
    /// Classification of the text.
    pub verdict: SpamVerdict,
    /// How the render was dispatched, `None` when spam rendering is off.
    pub render: Option<Dispatch>,
}

/// Routes chat between the local participant and the session.
///
/// Safe to share between threads; rendering always goes through the
/// [`ContextGuard`].
pub struct DeliveryRouter {
    collaborators: Collaborators,
    guard: ContextGuard,
    classifier: SpamClassifier,
    rules: SyncRwLock<SpamRuleSet>,
    chat_log: Option<ChatLog>,
    render_spam: bool,
}

impl DeliveryRouter {
    /// Creates a router using the rules and log settings from `config`.
    #[must_use]
    pub fn new(collaborators: Collaborators, guard: ContextGuard, config: &RelayConfig) -> Self {
        Self {
            collaborators,
            guard,
            classifier: SpamClassifier::new(),
            rules: SyncRwLock::new(SpamRuleSet::from(&config.spam)),
            chat_log: ChatLog::from_config(&config.log),
            render_spam: config.render_spam,
        }
    }

    /// Replaces the spam rules used for later messages.
    pub fn set_rules(&self, rules: SpamRuleSet) {
        *self.rules.write() = rules;
    }

    /// The classifier holding per-participant send history.
    #[must_use]
    pub const fn classifier(&self) -> &SpamClassifier {
        &self.classifier
    }

    /// Starts tracking a participant that just connected.
    pub fn participant_joined(&self, participant: &Participant) {
        log::debug!("Tracking {} in slot {}", participant.name, participant.slot);
        self.classifier.track(participant.id);
    }

    /// Drops the send history of a participant that disconnected.
    pub fn participant_left(&self, participant: ParticipantId) {
        self.classifier.forget(participant);
    }

    /// Sends a message from the local participant.
    ///
    /// Fails only when nothing could be sent at all. A recipient whose
    /// transport fails is skipped and reported in [`SendOutcome::failed`].
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(target = ?request.target, team_only = request.team_only)
    )]
    pub fn send(&self, request: SendRequest) -> Result<SendOutcome, RelayError> {
        let Collaborators {
            directory,
            session,
            affiliations,
            transport,
            ..
        } = &self.collaborators;

        if !session.is_session_active() {
            return Err(RelayError::SessionNotActive);
        }
        if let Some(slot) = request.target
            && directory.by_slot(slot).is_none()
        {
            return Err(RelayError::UnknownParticipant(slot));
        }

        let local = directory.local();
        let message = ChatMessage::new(local.handle, request.text, request.team_only)?;
        let verdict = self.classify_and_report(&local, &message);
        let bytes = message.encode();

        let ctx = AffiliationContext::capture(session.as_ref(), affiliations.as_ref());
        let mut delivered = Vec::new();
        let mut failed = Vec::new();
        for participant in directory.connected() {
            if !is_recipient(&local, &participant, request.target, request.team_only, &ctx) {
                continue;
            }
            match transport.send_bytes(&bytes, participant.connection) {
                Ok(()) => delivered.push(participant.slot),
                Err(err) => {
                    tracing::warn!(
                        slot = %participant.slot,
                        connection = %participant.connection,
                        %err,
                        "Failed to deliver chat message"
                    );
                    failed.push((participant.slot, err));
                }
            }
        }

        let render = request
            .render_locally
            .then(|| self.schedule_render(&message, &local.name));

        Ok(SendOutcome {
            message_id: message.message_id(),
            verdict,
            delivered,
            failed,
            render,
        })
    }

    /// Handles a packet that arrived on `connection`.
    #[tracing::instrument(level = "debug", skip(self, bytes), fields(len = bytes.len()))]
    pub fn receive(
        &self,
        connection: ConnectionId,
        bytes: &[u8],
    ) -> Result<InboundMessage, RelayError> {
        let message = ChatMessage::decode(bytes)?;
        let sender = self
            .collaborators
            .directory
            .by_connection(connection)
            .ok_or(RelayError::UnknownConnection(connection))?;
        if *message.sender_handle() != sender.handle {
            log::warn!(
                "Message on connection {connection} claims handle {:?}, directory has {:?} for {}",
                message.sender_handle(),
                sender.handle,
                sender.name
            );
        }

        let verdict = self.classify_and_report(&sender, &message);
        let render = (self.render_spam || !verdict.is_spam())
            .then(|| self.schedule_render(&message, &sender.name));

        Ok(InboundMessage {
            sender,
            message,
            verdict,
            render,
        })
    }

    fn classify_and_report(&self, sender: &Participant, message: &ChatMessage) -> SpamVerdict {
        let verdict = self
            .classifier
            .classify(sender, message.content(), &self.rules.read(), Instant::now());

        if verdict.is_spam() {
            log::info!("{verdict} on message from {} ({})", sender.name, sender.slot);
            self.collaborators.moderation.on_spam_verdict(sender, verdict);
        }

        if let Some(chat_log) = &self.chat_log
            && let Err(err) =
                chat_log.append(sender, message.content(), verdict, message.team_only())
        {
            log::warn!(
                "Failed to write {}: {err}",
                chat_log.path_for(verdict).display()
            );
        }

        verdict
    }

    fn schedule_render(&self, message: &ChatMessage, sender_name: &str) -> Dispatch {
        let renderer = Arc::clone(&self.collaborators.renderer);
        let text = message.content().to_owned();
        let sender_name = sender_name.to_owned();
        let team_only = message.team_only();
        self.guard.run_on_privileged_context(move || {
            renderer.show_message(&text, &sender_name, team_only);
        })
    }
}

/// A participant receives a message iff it is the target (or there is none)
/// and the send is targeted, global, or the participant is a teammate.
fn is_recipient(
    sender: &Participant,
    participant: &Participant,
    target: Option<ParticipantSlot>,
    team_only: bool,
    ctx: &AffiliationContext<'_>,
) -> bool {
    if target.is_some_and(|slot| slot != participant.slot) {
        return false;
    }
    target.is_some() || !team_only || same_team(sender.slot, participant.slot, ctx)
}
