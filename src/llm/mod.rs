//! LLM integration for TalentScout.
//!
//! The screening core treats the model as a fallible, slow collaborator.
//! It is used for two things only: suggesting candidate fields when local
//! extraction finds nothing, and generating the technical questions.
//!
//! rig-core's Groq client does the HTTP transport; `RigAdapter` bridges its
//! `CompletionModel` to our `LlmProvider` trait.

mod costs;
pub mod provider;
mod rig_adapter;

pub use provider::*;
pub use rig_adapter::RigAdapter;

use std::sync::Arc;

use rig::client::CompletionClient;
use secrecy::{ExposeSecret, SecretString};

use crate::error::{ConfigError, LlmError};

pub const DEFAULT_MODEL: &str = "llama3-70b-8192";

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: SecretString,
    pub model: String,
}

impl LlmConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Read `GROQ_API_KEY` and `TALENT_SCOUT_MODEL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("GROQ_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("GROQ_API_KEY".to_string()))?;

        let mut config = Self::new(SecretString::from(api_key));
        if let Ok(model) = std::env::var("TALENT_SCOUT_MODEL")
            && !model.trim().is_empty()
        {
            config.model = model;
        }
        Ok(config)
    }
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    use rig::providers::groq;

    let client: groq::Client =
        groq::Client::new(config.api_key.expose_secret()).map_err(|e| LlmError::RequestFailed {
            provider: "groq".to_string(),
            reason: format!("Failed to create Groq client: {}", e),
        })?;

    let model = client.completion_model(&config.model);
    tracing::info!("Using Groq (model: {})", config.model);
    Ok(Arc::new(RigAdapter::new(model, &config.model)))
}

/// Extract a JSON object from model output that might contain markdown or extra text.
pub fn extract_json_object(text: &str) -> String {
    let trimmed = text.trim();

    if trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && end > start
    {
        return trimmed[start..=end].to_string();
    }

    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_provider_constructs_without_network() {
        // The key is only checked when a request is made.
        let config = LlmConfig::new(SecretString::from("gsk-test"));
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.model_name(), DEFAULT_MODEL);
    }

    #[test]
    fn create_provider_prices_the_configured_model() {
        let config = LlmConfig {
            model: "llama3-8b-8192".to_string(),
            ..LlmConfig::new(SecretString::from("gsk-test"))
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.model_name(), "llama3-8b-8192");
        assert!(provider.cost_per_token().0 > rust_decimal::Decimal::ZERO);
    }

    #[test]
    fn extract_json_direct() {
        let input = r#"{"questions": []}"#;
        assert_eq!(extract_json_object(input), input);
    }

    #[test]
    fn extract_json_from_markdown() {
        let input = "Here you go:\n```json\n{\"questions\": [\"a\"]}\n```\n";
        let result = extract_json_object(input);
        assert!(result.starts_with('{'));
        assert!(result.contains("\"a\""));
    }

    #[test]
    fn extract_json_with_surrounding_text() {
        let input = "Sure! {\"candidate_info\": {}} hope that helps";
        let result = extract_json_object(input);
        assert!(result.starts_with('{'));
        assert!(result.ends_with('}'));
    }
}
