//! Moderation hook invoked when a message is classified as spam.

use crate::participant::Participant;
use crate::spam::SpamVerdict;

/// Receives spam verdicts. Persisting infractions or flagging the sender is
/// up to the implementation.
pub trait ModerationHook: Send + Sync {
    /// Called once per message whose verdict is not [`SpamVerdict::NotSpam`].
    fn on_spam_verdict(&self, participant: &Participant, verdict: SpamVerdict);
}
