//! Technical question generation: request building, the remote call, and
//! parsing whatever shape of answer the model returns.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::LlmError;
use crate::llm::{extract_json_object, ChatMessage, CompletionRequest, LlmProvider};

use super::profile::CandidateProfile;
use super::prompts::question_generation_prompt;

static NUMBERING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:\d{1,2}\s*[.):-]|[-*•])\s*").unwrap());

/// Key used when the model returns questions without grouping them by technology.
pub const GENERAL_TOPIC: &str = "general";

/// Difficulty band derived from years of experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceBracket {
    /// Under 2 years.
    Junior,
    /// 2 to 5 years.
    Mid,
    /// Over 5 years.
    Senior,
}

impl ExperienceBracket {
    pub fn from_years(years: f32) -> Self {
        if years < 2.0 {
            Self::Junior
        } else if years <= 5.0 {
            Self::Mid
        } else {
            Self::Senior
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Junior => "<2 years",
            Self::Mid => "2-5 years",
            Self::Senior => "5+ years",
        }
    }

    pub fn difficulty(&self) -> &'static str {
        match self {
            Self::Junior => "foundational",
            Self::Mid => "intermediate",
            Self::Senior => "advanced",
        }
    }
}

/// Everything the model needs to write questions: tech stack and experience only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRequest {
    /// Sorted, normalised technology names.
    pub technologies: Vec<String>,
    pub years_of_experience: f32,
    pub bracket: ExperienceBracket,
    pub min_per_technology: u8,
    pub max_per_technology: u8,
}

impl QuestionRequest {
    /// Build a request from the profile. Returns `None` unless both the tech
    /// stack and years of experience are known.
    pub fn from_profile(
        profile: &CandidateProfile,
        per_technology: &RangeInclusive<u8>,
    ) -> Option<Self> {
        let technologies: Vec<String> = profile.tech_stack()?.iter().cloned().collect();
        if technologies.is_empty() {
            return None;
        }
        let years = profile.years_of_experience()?;
        Some(Self {
            technologies,
            years_of_experience: years,
            bracket: ExperienceBracket::from_years(years),
            min_per_technology: *per_technology.start(),
            max_per_technology: *per_technology.end(),
        })
    }

    fn completion_request(&self) -> CompletionRequest {
        CompletionRequest::new(vec![
            ChatMessage::system(
                "You are a senior technical interviewer. Output only valid JSON.",
            ),
            ChatMessage::user(question_generation_prompt(self)),
        ])
        .with_temperature(0.2)
        .with_max_tokens(1500)
        .with_json_response()
    }
}

/// Generated questions grouped by technology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSet {
    pub bracket: ExperienceBracket,
    pub by_technology: BTreeMap<String, Vec<String>>,
}

impl QuestionSet {
    pub fn total(&self) -> usize {
        self.by_technology.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Calls the model to produce questions for a `QuestionRequest`.
pub struct QuestionGenerator {
    llm: Arc<dyn LlmProvider>,
    timeout: Duration,
}

impl QuestionGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    /// Ask the model for questions, bounded by the configured timeout.
    pub async fn generate(&self, request: &QuestionRequest) -> Result<QuestionSet, LlmError> {
        info!(
            technologies = ?request.technologies,
            bracket = ?request.bracket,
            "Generating technical questions"
        );

        let response = tokio::time::timeout(self.timeout, self.llm.complete(request.completion_request()))
            .await
            .map_err(|_| LlmError::Timeout {
                provider: self.llm.model_name().to_string(),
                timeout: self.timeout,
            })??;

        info!(
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            cost_usd = %self.llm.estimate_cost(&response),
            "Question generation finished"
        );

        parse_questions(&response.content, request).ok_or_else(|| LlmError::InvalidResponse {
            provider: self.llm.model_name().to_string(),
            reason: "no questions found in response".to_string(),
        })
    }
}

/// Parse model output into a `QuestionSet`.
///
/// Accepts `{"questions": {"tech": [..]}}`, `{"questions": [..]}`, or plain
/// text with one question per line. Leading numbering is stripped and each
/// group is capped at the request's maximum.
pub fn parse_questions(raw: &str, request: &QuestionRequest) -> Option<QuestionSet> {
    let max = usize::from(request.max_per_technology.max(1));
    let mut by_technology: BTreeMap<String, Vec<String>> = BTreeMap::new();

    match serde_json::from_str::<serde_json::Value>(&extract_json_object(raw)) {
        Ok(value) => match value.get("questions") {
            Some(serde_json::Value::Object(groups)) => {
                for (tech, questions) in groups {
                    let cleaned = clean_list(questions, max);
                    if !cleaned.is_empty() {
                        by_technology.insert(tech.trim().to_lowercase(), cleaned);
                    }
                }
            }
            Some(list @ serde_json::Value::Array(_)) => {
                let cleaned = clean_list(list, max * request.technologies.len().max(1));
                if !cleaned.is_empty() {
                    by_technology.insert(GENERAL_TOPIC.to_string(), cleaned);
                }
            }
            _ => {
                warn!("Question response JSON has no usable 'questions' field");
            }
        },
        Err(_) => {
            let lines: Vec<String> = raw
                .lines()
                .map(strip_numbering)
                .filter(|l| !l.is_empty())
                .take(max * request.technologies.len().max(1))
                .collect();
            if !lines.is_empty() {
                by_technology.insert(GENERAL_TOPIC.to_string(), lines);
            }
        }
    }

    let set = QuestionSet {
        bracket: request.bracket,
        by_technology,
    };
    (!set.is_empty()).then_some(set)
}

fn clean_list(value: &serde_json::Value, max: usize) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|q| q.as_str())
                .map(strip_numbering)
                .filter(|q| !q.is_empty())
                .take(max)
                .collect()
        })
        .unwrap_or_default()
}

fn strip_numbering(line: &str) -> String {
    NUMBERING_RE.replace(line.trim(), "").trim().to_string()
}
