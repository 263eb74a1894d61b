//! Configuration types.

use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

/// Exit keywords used when `TALENT_SCOUT_EXIT_KEYWORDS` is not set.
pub const DEFAULT_EXIT_KEYWORDS: &[&str] = &["exit", "bye", "goodbye", "quit", "stop"];

/// Screening conversation configuration.
#[derive(Debug, Clone)]
pub struct ScreeningConfig {
    /// Whole-word phrases that end the conversation.
    pub exit_keywords: Vec<String>,
    /// Upper bound on any single call to the language model.
    pub llm_timeout: Duration,
    /// How many questions to request per technology.
    pub questions_per_technology: RangeInclusive<u8>,
    /// Ask the language model for field suggestions when local extraction finds nothing.
    pub remote_extraction: bool,
    /// How many history entries are sent to the model for context.
    pub history_window: usize,
    /// Directory where finished conversations are saved.
    pub session_dir: PathBuf,
    /// Base64 key that seals saved conversations. When unset the binary uses
    /// a one-off key, so sessions cannot be reopened after a restart.
    pub encryption_key: Option<SecretString>,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            exit_keywords: DEFAULT_EXIT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            llm_timeout: Duration::from_secs(30),
            questions_per_technology: 3..=5,
            remote_extraction: true,
            history_window: 5,
            session_dir: PathBuf::from("./candidate_data"),
            encryption_key: None,
        }
    }
}

impl ScreeningConfig {
    /// Build a config from environment variables, falling back to defaults
    /// for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let exit_keywords: Vec<String> = std::env::var("TALENT_SCOUT_EXIT_KEYWORDS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let llm_timeout = std::env::var("TALENT_SCOUT_LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.llm_timeout);

        let remote_extraction = std::env::var("TALENT_SCOUT_REMOTE_EXTRACTION")
            .ok()
            .and_then(|s| parse_bool(&s))
            .unwrap_or(defaults.remote_extraction);

        let session_dir = std::env::var("TALENT_SCOUT_SESSION_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.session_dir.clone());

        let encryption_key = std::env::var("TALENT_SCOUT_ENCRYPTION_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .map(SecretString::from);

        Self {
            exit_keywords: if exit_keywords.is_empty() {
                defaults.exit_keywords
            } else {
                exit_keywords
            },
            llm_timeout,
            remote_extraction,
            session_dir,
            encryption_key,
            ..defaults
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = ScreeningConfig::default();
        assert!(config.exit_keywords.contains(&"bye".to_string()));
        assert!(config.exit_keywords.contains(&"stop".to_string()));
        assert_eq!(config.llm_timeout, Duration::from_secs(30));
        assert_eq!(config.questions_per_technology, 3..=5);
        assert!(config.remote_extraction);
        assert!(config.encryption_key.is_none());
    }

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" off "), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
