//! Static spam rules: keyword table, thresholds and policy flags.

use crate::config::SpamConfig;
use crate::spam::keywords::DEFAULT_KEYWORDS;

/// Messages longer than this many bytes can trip the timer rule.
pub const DEFAULT_SPAM_LENGTH: usize = 25;
/// Window of the timer rule, in whole seconds.
pub const DEFAULT_SPAM_TIMER_SECONDS: u64 = 2;

/// Immutable rule set consulted by [`super::SpamClassifier`].
#[derive(Clone, Debug)]
pub struct SpamRuleSet {
    /// Lowercased patterns, first occurrence order, no duplicates.
    keywords: Vec<String>,
    /// Length (bytes) a message must exceed for the timer rule to apply.
    pub spam_length: usize,
    /// Timer rule window in whole seconds.
    pub spam_timer_seconds: u64,
    /// Whether the timer rule runs at all.
    pub use_spam_timer: bool,
    /// Whether friends bypass classification like trusted participants do.
    pub trust_friends: bool,
}

impl SpamRuleSet {
    /// Rules with the given patterns and default thresholds.
    #[must_use]
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rules = Self {
            keywords: Vec::new(),
            spam_length: DEFAULT_SPAM_LENGTH,
            spam_timer_seconds: DEFAULT_SPAM_TIMER_SECONDS,
            use_spam_timer: true,
            trust_friends: true,
        };
        rules.extend_keywords(keywords);
        rules
    }

    fn extend_keywords<I, S>(&mut self, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for keyword in keywords {
            let keyword = keyword.as_ref().to_ascii_lowercase();
            if !keyword.is_empty() && !self.keywords.contains(&keyword) {
                self.keywords.push(keyword);
            }
        }
    }

    /// The patterns, lowercased.
    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// First pattern contained in `text`, ignoring ASCII case.
    #[must_use]
    pub fn matching_keyword(&self, text: &str) -> Option<&str> {
        let text = text.to_ascii_lowercase();
        self.keywords
            .iter()
            .find(|keyword| text.contains(keyword.as_str()))
            .map(String::as_str)
    }
}

impl Default for SpamRuleSet {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS)
    }
}

impl From<&SpamConfig> for SpamRuleSet {
    fn from(config: &SpamConfig) -> Self {
        let mut rules = Self::default();
        rules.extend_keywords(&config.extra_keywords);
        rules.spam_length = config.spam_length;
        rules.spam_timer_seconds = config.spam_timer_seconds;
        rules.use_spam_timer = config.use_spam_timer;
        rules.trust_friends = config.trust_friends;
        rules
    }
}
