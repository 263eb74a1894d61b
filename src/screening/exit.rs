//! Exit detection: whole-word, case-insensitive termination keywords.

use crate::config::DEFAULT_EXIT_KEYWORDS;

/// Detects conversation-ending intent in an utterance.
#[derive(Debug, Clone)]
pub struct ExitDetector {
    /// Each keyword or phrase, pre-split into lowercase words.
    phrases: Vec<Vec<String>>,
}

impl ExitDetector {
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Self {
        let phrases = keywords
            .iter()
            .map(|k| tokenize(k.as_ref()))
            .filter(|words| !words.is_empty())
            .collect();
        Self { phrases }
    }

    /// True when any keyword appears as a standalone word or word sequence.
    ///
    /// Hyphens and apostrophes bind words together, so "bye-the-way" and
    /// "byelaw" never match "bye".
    pub fn is_exit(&self, utterance: &str) -> bool {
        let words = tokenize(utterance);
        self.phrases.iter().any(|phrase| {
            words
                .windows(phrase.len())
                .any(|window| window == phrase.as_slice())
        })
    }
}

impl Default for ExitDetector {
    fn default() -> Self {
        Self::new(DEFAULT_EXIT_KEYWORDS)
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '\''))
        .map(|w| w.trim_matches(|c: char| c == '-' || c == '\''))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}
