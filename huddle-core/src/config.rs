//! Relay configuration, stored as JSON5.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spam::{DEFAULT_SPAM_LENGTH, DEFAULT_SPAM_TIMER_SECONDS};

/// Default capacity of the privileged job queue.
pub const DEFAULT_JOB_QUEUE_CAPACITY: usize = 256;

/// Errors loading or creating a config file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading or writing the file failed.
    #[error("config file i/o failed: {0}")]
    Io(#[from] io::Error),
    /// The file is not valid JSON5 for [`RelayConfig`].
    #[error("invalid config: {0}")]
    Parse(String),
    /// The defaults could not be serialized.
    #[error("failed to serialize default config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Spam classification settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpamConfig {
    /// Enables the timer rule.
    pub use_spam_timer: bool,
    /// Timer rule window in whole seconds.
    pub spam_timer_seconds: u64,
    /// Messages must be longer than this to trip the timer rule.
    pub spam_length: usize,
    /// Friends skip classification.
    pub trust_friends: bool,
    /// Patterns added to the built-in keyword table.
    pub extra_keywords: Vec<String>,
}

impl Default for SpamConfig {
    fn default() -> Self {
        Self {
            use_spam_timer: true,
            spam_timer_seconds: DEFAULT_SPAM_TIMER_SECONDS,
            spam_length: DEFAULT_SPAM_LENGTH,
            trust_friends: true,
            extra_keywords: Vec::new(),
        }
    }
}

/// Chat log settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Append every relayed message to a log file.
    pub log_chat_messages: bool,
    /// Log for messages that are not spam.
    pub chat_log_path: PathBuf,
    /// Log for spam.
    pub spam_log_path: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_chat_messages: true,
            chat_log_path: PathBuf::from("logs/chat.log"),
            spam_log_path: PathBuf::from("logs/spam.log"),
        }
    }
}

/// Top-level relay configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Classifier settings.
    pub spam: SpamConfig,
    /// Chat log settings.
    pub log: LogConfig,
    /// Render inbound messages even when they are classified as spam.
    pub render_spam: bool,
    /// Pending privileged jobs allowed before new ones are dropped.
    pub job_queue_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            spam: SpamConfig::default(),
            log: LogConfig::default(),
            render_spam: false,
            job_queue_capacity: DEFAULT_JOB_QUEUE_CAPACITY,
        }
    }
}

impl RelayConfig {
    /// Parses a JSON5 document. Missing fields take their defaults.
    pub fn from_json5(text: &str) -> Result<Self, ConfigError> {
        serde_json5::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Loads `path`, writing the defaults there first if it does not exist.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let text = fs::read_to_string(path)?;
            return Self::from_json5(&text);
        }

        let config = Self::default();
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&config)?)?;
        log::info!("Wrote default config to {}", path.display());
        Ok(config)
    }
}
