//! Spam classification.
//!
//! Rules run in a fixed order and the first hit wins:
//!
//! 1. Trusted senders, and friends when `trust_friends` is set, are never spam.
//!    Their send history is not touched.
//! 2. Timer rule: the previous send time is read and replaced with `now`.
//!    A long message sent within the window of the previous one is spam.
//! 3. Keyword rule: any banned pattern in the text is spam.

pub mod keywords;
mod rules;
mod send_state;

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use huddle_utils::locks::{SyncMutex, SyncRwLock};
use rustc_hash::FxHashMap;

use crate::participant::{Participant, ParticipantId};

pub use rules::{DEFAULT_SPAM_LENGTH, DEFAULT_SPAM_TIMER_SECONDS, SpamRuleSet};
pub use send_state::ParticipantSendState;

/// Outcome of classifying one message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpamVerdict {
    /// Nothing matched.
    NotSpam,
    /// The text contained a banned pattern.
    StaticMatch,
    /// A long message followed the previous one too quickly.
    TimerMatch,
}

impl SpamVerdict {
    /// Whether the verdict flags the message.
    #[must_use]
    pub const fn is_spam(self) -> bool {
        !matches!(self, Self::NotSpam)
    }
}

impl fmt::Display for SpamVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotSpam => "Not Spam",
            Self::StaticMatch => "Static Detection",
            Self::TimerMatch => "Timer Detection",
        })
    }
}

/// Classifies messages and owns every participant's send history.
///
/// History entries live from [`Self::track`] (or the first classified
/// message) until [`Self::forget`].
#[derive(Default)]
pub struct SpamClassifier {
    states: SyncRwLock<FxHashMap<ParticipantId, Arc<SyncMutex<ParticipantSendState>>>>,
}

impl SpamClassifier {
    /// Creates a classifier with no tracked participants.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking a newly connected participant.
    pub fn track(&self, participant: ParticipantId) {
        self.states
            .write()
            .entry(participant)
            .or_insert_with(|| Arc::new(SyncMutex::new(ParticipantSendState::new())));
    }

    /// Drops a disconnected participant's history.
    pub fn forget(&self, participant: ParticipantId) {
        self.states.write().remove(&participant);
    }

    /// Number of participants with send history.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.states.read().len()
    }

    /// When the participant's last classified message arrived.
    #[must_use]
    pub fn last_message_time(&self, participant: ParticipantId) -> Option<Instant> {
        let state = self.states.read().get(&participant).cloned()?;
        state.lock().last_message_time
    }

    fn state_for(&self, participant: ParticipantId) -> Arc<SyncMutex<ParticipantSendState>> {
        if let Some(state) = self.states.read().get(&participant) {
            return state.clone();
        }
        self.states
            .write()
            .entry(participant)
            .or_insert_with(|| Arc::new(SyncMutex::new(ParticipantSendState::new())))
            .clone()
    }

    /// Labels `text` sent by `sender` at `now`.
    ///
    /// Never fails; anything the rules do not flag is [`SpamVerdict::NotSpam`].
    pub fn classify(
        &self,
        sender: &Participant,
        text: &str,
        rules: &SpamRuleSet,
        now: Instant,
    ) -> SpamVerdict {
        if sender.trusted || (rules.trust_friends && sender.friend) {
            return SpamVerdict::NotSpam;
        }

        if rules.use_spam_timer {
            let state = self.state_for(sender.id);
            let previous = state.lock().record(now);
            if let Some(previous) = previous {
                let elapsed = now.saturating_duration_since(previous).as_secs();
                if text.len() > rules.spam_length && elapsed <= rules.spam_timer_seconds {
                    return SpamVerdict::TimerMatch;
                }
            }
        }

        if let Some(keyword) = rules.matching_keyword(text) {
            log::debug!("Message from {} matched banned pattern {keyword:?}", sender.name);
            return SpamVerdict::StaticMatch;
        }

        SpamVerdict::NotSpam
    }
}
