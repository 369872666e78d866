//! Append-only chat and spam logs.

use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use huddle_utils::locks::SyncMutex;

use crate::config::LogConfig;
use crate::participant::Participant;
use crate::spam::SpamVerdict;

const TIMESTAMP_FORMAT: &str = "%m/%d/%Y %I:%M:%S:%3f %p";

/// Writes one line per relayed message, spam to one file and everything
/// else to the other.
#[derive(Debug)]
pub struct ChatLog {
    chat_path: PathBuf,
    spam_path: PathBuf,
    // Serializes appends so concurrent lines never interleave.
    write_lock: SyncMutex<()>,
}

impl ChatLog {
    /// A log writing to the given files. Nothing is created until the first append.
    #[must_use]
    pub fn new(chat_path: impl Into<PathBuf>, spam_path: impl Into<PathBuf>) -> Self {
        Self {
            chat_path: chat_path.into(),
            spam_path: spam_path.into(),
            write_lock: SyncMutex::new(()),
        }
    }

    /// The log described by `config`, or `None` when logging is off.
    #[must_use]
    pub fn from_config(config: &LogConfig) -> Option<Self> {
        config
            .log_chat_messages
            .then(|| Self::new(&config.chat_log_path, &config.spam_log_path))
    }

    /// File that lines with `verdict` go to.
    #[must_use]
    pub fn path_for(&self, verdict: SpamVerdict) -> &Path {
        if verdict.is_spam() {
            &self.spam_path
        } else {
            &self.chat_path
        }
    }

    /// Appends a line for `content` sent by `participant`, stamped with the local time.
    pub fn append(
        &self,
        participant: &Participant,
        content: &str,
        verdict: SpamVerdict,
        team_only: bool,
    ) -> io::Result<()> {
        let line = format_line(
            Local::now().naive_local(),
            participant,
            content,
            verdict,
            team_only,
        );
        let path = self.path_for(verdict);

        let _guard = self.write_lock.lock();
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(line.as_bytes())
    }
}

/// Renders one log line, newline included.
#[must_use]
pub fn format_line(
    time: NaiveDateTime,
    participant: &Participant,
    content: &str,
    verdict: SpamVerdict,
    team_only: bool,
) -> String {
    let mut line = String::with_capacity(64 + participant.name.len() + content.len());
    if verdict.is_spam() {
        let _ = write!(line, "({verdict}) ");
    }
    let _ = write!(line, "[{}] ", time.format(TIMESTAMP_FORMAT));
    push_single_line(&mut line, &participant.name);
    let _ = write!(line, " ({}) ", participant.handle.account_id().unwrap_or(0));
    match participant.address {
        Some(address) => {
            let _ = write!(line, "<{address}> ");
        }
        None => line.push_str("<UNKNOWN> "),
    }
    line.push_str(if team_only { "[TEAM]: " } else { "[ALL]: " });
    push_single_line(&mut line, content);
    line.push('\n');
    line
}

/// Appends `text` with line breaks escaped, so each entry stays on one line.
fn push_single_line(line: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '\n' => line.push_str("\\n"),
            '\r' => line.push_str("\\r"),
            _ => line.push(ch),
        }
    }
}
