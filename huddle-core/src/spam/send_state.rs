//! Per-participant send history used by the timer rule.

use std::time::Instant;

/// Send history for one connected participant.
///
/// Stored behind its own `SyncMutex` in the classifier so messages from one
/// participant are evaluated one at a time.
#[derive(Debug, Default)]
pub struct ParticipantSendState {
    /// When the participant's previous message was classified.
    pub last_message_time: Option<Instant>,
}

impl ParticipantSendState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_message_time: None,
        }
    }

    /// Stores `now` and returns the time it replaced.
    pub fn record(&mut self, now: Instant) -> Option<Instant> {
        self.last_message_time.replace(now)
    }
}
