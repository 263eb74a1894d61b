//! Remote enrichment: asks the language model for field suggestions when
//! local extraction found nothing.
//!
//! The model's output is untrusted. Suggestions enter at heuristic
//! confidence and every value is re-validated by the slot tracker on merge.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::LlmError;
use crate::llm::{extract_json_object, ChatMessage, CompletionRequest, LlmProvider};

use super::extractor::{split_positions, split_technologies, ExtractionResult, HEURISTIC};
use super::profile::{Field, FieldValue};
use super::prompts::{extraction_prompt, extraction_system_prompt};
use super::slots;
use super::state::ConversationState;

static LEADING_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());

/// Placeholder strings models use for "not provided".
const EMPTY_MARKERS: &[&str] = &["unknown", "null", "none", "n/a", "not provided"];

/// Field suggestions from the language model.
pub struct RemoteExtractor {
    llm: Arc<dyn LlmProvider>,
    timeout: Duration,
    history_window: usize,
}

impl RemoteExtractor {
    pub fn new(llm: Arc<dyn LlmProvider>, timeout: Duration, history_window: usize) -> Self {
        Self {
            llm,
            timeout,
            history_window,
        }
    }

    /// Ask the model which fields `utterance` provides.
    pub async fn suggest(
        &self,
        state: &ConversationState,
        utterance: &str,
    ) -> Result<ExtractionResult, LlmError> {
        let history = state.recent_messages(self.history_window);
        let next = slots::missing_fields(&state.profile).first().copied();
        let request = CompletionRequest::new(vec![
            ChatMessage::system(extraction_system_prompt()),
            ChatMessage::user(extraction_prompt(&history, &state.profile, utterance, next)),
        ])
        .with_temperature(0.2)
        .with_max_tokens(1000)
        .with_json_response();

        let response = tokio::time::timeout(self.timeout, self.llm.complete(request))
            .await
            .map_err(|_| LlmError::Timeout {
                provider: self.llm.model_name().to_string(),
                timeout: self.timeout,
            })??;

        let result = parse_candidate_info(&response.content)?;
        debug!(
            conversation_id = %state.id,
            fields = ?result.fields(),
            "Remote extraction suggestions"
        );
        Ok(result)
    }
}

/// Parse a `{"candidate_info": {...}}` object into heuristic proposals.
///
/// Unknown keys and placeholder values are skipped. A response without a
/// `candidate_info` object is treated as having no suggestions.
pub fn parse_candidate_info(raw: &str) -> Result<ExtractionResult, serde_json::Error> {
    let value: Value = serde_json::from_str(&extract_json_object(raw))?;
    let mut result = ExtractionResult::new();

    let Some(info) = value.get("candidate_info").and_then(Value::as_object) else {
        return Ok(result);
    };

    for (key, raw_value) in info {
        let Some(field) = Field::from_key(key) else {
            continue;
        };
        if let Some(value) = convert(field, raw_value) {
            result.insert(field, value, HEURISTIC);
        }
    }
    Ok(result)
}

fn convert(field: Field, value: &Value) -> Option<FieldValue> {
    match (field, value) {
        (_, Value::Null) => None,
        (Field::Experience, Value::Number(n)) => n.as_f64().map(|y| FieldValue::Years(y as f32)),
        (Field::Experience, Value::String(s)) => meaningful(s)
            .and_then(|s| LEADING_NUMBER_RE.find(s))
            .and_then(|m| m.as_str().parse::<f32>().ok())
            .map(FieldValue::Years),
        (Field::DesiredPosition, Value::String(s)) => meaningful(s)
            .map(split_positions)
            .filter(|p| !p.is_empty())
            .map(FieldValue::Positions),
        (Field::DesiredPosition, Value::Array(items)) => {
            let positions: Vec<String> = strings(items).flat_map(split_positions).collect();
            (!positions.is_empty()).then_some(FieldValue::Positions(positions))
        }
        (Field::TechStack, Value::String(s)) => meaningful(s)
            .map(split_technologies)
            .filter(|t| !t.is_empty())
            .map(FieldValue::Technologies),
        (Field::TechStack, Value::Array(items)) => {
            let techs: std::collections::BTreeSet<String> =
                strings(items).flat_map(split_technologies).collect();
            (!techs.is_empty()).then_some(FieldValue::Technologies(techs))
        }
        (_, Value::String(s)) => meaningful(s).map(|s| FieldValue::Text(s.to_string())),
        (_, Value::Number(n)) => Some(FieldValue::Text(n.to_string())),
        _ => None,
    }
}

fn strings(items: &[Value]) -> impl Iterator<Item = &str> {
    items.iter().filter_map(Value::as_str).filter_map(meaningful)
}

fn meaningful(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    let lowered = trimmed.to_lowercase();
    if trimmed.is_empty() || EMPTY_MARKERS.contains(&lowered.as_str()) {
        None
    } else {
        Some(trimmed)
    }
}
