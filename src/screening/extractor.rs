//! Local field extraction from free-form candidate utterances.
//!
//! Extraction is deterministic and pattern based. Fields can appear in any
//! order and several can appear in one utterance. Nothing here fails: an
//! utterance with nothing recognisable yields an empty result.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::profile::{CandidateProfile, Field, FieldValue};
use super::slots;

/// Confidence for exact-format matches (email, phone, "N years").
pub const EXACT: f32 = 1.0;
/// Confidence for values introduced by an explicit label ("my name is").
pub const LABELLED: f32 = 0.9;
/// Confidence for free-text guesses.
pub const HEURISTIC: f32 = 0.5;

static EMAIL_CANDIDATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+\-]+@[^\s,;<>()]*").unwrap());

static PHONE_CANDIDATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+\d{1,3}[\s.\-]?)?(?:\(\d{1,4}\)[\s.\-]?)?\d[\d\s.\-]{5,}\d").unwrap()
});

static PHONE_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:phone|mobile|cell|number|contact|call|whatsapp)\b").unwrap());

static YEARS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?P<n>\d{1,2}(?:\.\d+)?)\s*\+?\s*(?:years?|yrs?)\b(?P<rest>\s+old\b)?").unwrap()
});

static YEARS_WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?P<w>[a-z]+)\s+(?:years?|yrs?)\b(?P<rest>\s+old\b)?").unwrap()
});

static EXPERIENCE_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bexperience\s*(?:is|of|:|-)?\s*(?P<n>\d{1,2}(?:\.\d+)?)\b").unwrap()
});

static FRESHER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:fresher|fresh graduate|no (?:prior |professional |work )?experience)\b").unwrap()
});

static BARE_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:about|around|roughly|nearly|almost|over|approx(?:imately)?)?\s*(?P<n>\d{1,2}(?:\.\d+)?)\s*\+?\s*(?:years?|yrs?)?\s*[.!]?$").unwrap()
});

static NAME_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:my name is|my name's|name is|name:|call me)\s+(?P<v>[a-z][a-z'\-]*(?:\s+[a-z][a-z'\-]*){0,3})").unwrap()
});

static NAME_GREETING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:I'm|I am|Im|this is|This is)\s+(?P<v>[A-Z][A-Za-z'\-]*(?:\s+[A-Z][A-Za-z'\-]*){0,2})").unwrap()
});

static LOCATION_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:i live in|living in|based (?:in|out of)|located in|location(?:\s+is|:)|currently (?:in|at|living in)|i'm in|i am in|residing in|reside in|relocating to)\s+(?P<v>[^,.;!?\n]+)").unwrap()
});

static LOCATION_FROM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:from|From)\s+(?P<v>[A-Z][^,.;!?\n]*)").unwrap());

static POSITION_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:position|role|job title)s?\s*(?:is|are|would be|:)\s*(?:an?\s+|the\s+)?(?P<v>[^.;!?\n]+)").unwrap()
});

static POSITION_SEEKING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:looking for|applying for|apply for|interested in|aiming for)\s+(?:an?\s+|the\s+)?(?P<v>[^.,;!?\n]+?)\s+(?:role|position|job|opening)s?\b").unwrap()
});

static POSITION_WANT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:want to (?:be|work as|become)|would like to (?:be|work as)|role as|position as)\s+(?:an?\s+|the\s+)?(?P<v>[^.,;!?\n]+)").unwrap()
});

static TECH_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:tech(?:nology)?\s*stack|skill\s*set|skills|technologies)\s*(?:is|are|includes?|consists of|:|-)?\s*(?P<v>(?:[^.!?\n]|\.[A-Za-z0-9])+)").unwrap()
});

static TECH_USAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:i (?:work|code|program|develop) (?:with|in|using)|(?:proficient|skilled|expert) (?:in|with)|familiar with|experience (?:with|in)|worked with|i use|i know)\s+(?P<v>(?:[^.!?\n]|\.[A-Za-z0-9])+)").unwrap()
});

static TECH_SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*(?:[,;/|&]|\band\b|\bplus\b)\s*").unwrap());

/// Words that end a captured name or place.
const STOP_WORDS: &[&str] = &[
    "and", "i", "i'm", "im", "from", "with", "here", "based", "living", "currently", "working",
    "looking", "a", "an", "the", "my", "have", "am", "is", "in", "at", "to", "for", "years",
    "year", "but", "who", "so",
];

/// Words that by themselves never constitute an answer.
const FILLER_WORDS: &[&str] = &[
    "yes", "no", "ok", "okay", "hmm", "hm", "um", "uh", "sure", "hello", "hi", "hey", "thanks",
    "thank", "you", "please", "what", "why", "how", "who", "which", "huh", "idk", "sorry",
    "nothing", "maybe", "well", "fine", "good", "great", "cool", "nice", "i", "not", "don't",
    "dont", "know", "unsure", "rather", "skip", "pass", "nope", "later", "say",
];

/// First words that mark a hedge or refusal rather than an answer.
const NON_ANSWER_LEADS: &[&str] = &[
    "i", "i'd", "i'll", "not", "no", "don't", "dont", "can't", "cannot", "won't", "prefer",
    "rather", "skip", "pass", "nope", "none", "later", "dunno",
];

/// Technologies recognised in an unlabelled answer.
const KNOWN_TECHNOLOGIES: &[&str] = &[
    "rust", "python", "java", "javascript", "typescript", "go", "golang", "c", "c++", "c#",
    "ruby", "php", "kotlin", "swift", "scala", "elixir", "haskell", "dart", "r", "perl", "lua",
    "react", "angular", "vue", "svelte", "django", "flask", "fastapi", "spring", "spring boot",
    "rails", "laravel", "node", "nodejs", "express", "nextjs", "flutter", "react native",
    "docker", "kubernetes", "k8s", "aws", "azure", "gcp", "terraform", "ansible", "jenkins",
    "postgresql", "postgres", "mysql", "sqlite", "mongodb", "redis", "kafka", "graphql", "sql",
    "linux", "git", "html", "css", "tailwind", "tensorflow", "pytorch", "pandas", "numpy",
    "spark", "hadoop", "dotnet", "android", "ios", "firebase", "elasticsearch", "rabbitmq",
];

const QUESTION_WORDS: &[&str] = &[
    "what", "why", "how", "who", "which", "when", "where", "can", "could", "do", "does", "is",
    "are", "should", "would",
];

/// Leading phrases stripped before reading a bare answer.
const LEADING_FILLERS: &[&str] = &[
    "my name is ", "it's ", "it is ", "i'm ", "i am ", "this is ", "i live in ", "i'm in ",
    "i am in ", "based in ", "in ", "from ", "i use ", "i know ", "mostly ", "i want to be ",
    "i'd like to be ", "looking for ", "a ", "an ", "the ",
];

const NUMBER_WORDS: &[(&str, f32)] = &[
    ("zero", 0.0), ("one", 1.0), ("two", 2.0), ("three", 3.0), ("four", 4.0), ("five", 5.0),
    ("six", 6.0), ("seven", 7.0), ("eight", 8.0), ("nine", 9.0), ("ten", 10.0),
    ("eleven", 11.0), ("twelve", 12.0), ("fifteen", 15.0), ("twenty", 20.0),
];

/// A proposed value for one field.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub value: FieldValue,
    pub confidence: f32,
}

/// Field proposals detected in one utterance. May be empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionResult {
    proposals: BTreeMap<Field, Proposal>,
}

impl ExtractionResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a proposal, keeping the existing one unless the new one is more confident.
    pub fn insert(&mut self, field: Field, value: FieldValue, confidence: f32) {
        let confidence = confidence.clamp(0.0, 1.0);
        match self.proposals.get(&field) {
            Some(existing) if existing.confidence >= confidence => {}
            _ => {
                self.proposals.insert(field, Proposal { value, confidence });
            }
        }
    }

    pub fn get(&self, field: Field) -> Option<&Proposal> {
        self.proposals.get(&field)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.proposals.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Field, &Proposal)> {
        self.proposals.iter()
    }

    pub fn fields(&self) -> Vec<Field> {
        self.proposals.keys().copied().collect()
    }
}

/// Stateless pattern-based extractor.
#[derive(Debug, Clone, Default)]
pub struct FieldExtractor;

impl FieldExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Propose field values found in `utterance`.
    ///
    /// `known` is used for disambiguation only: a bare answer is read as the
    /// field the candidate was last asked for, and a bare small number is
    /// read as years of experience while that field is unset.
    pub fn extract(&self, utterance: &str, known: &CandidateProfile) -> ExtractionResult {
        let mut result = ExtractionResult::new();
        let text = utterance.trim();
        if text.is_empty() {
            return result;
        }

        let awaited = slots::missing_fields(known).first().copied();

        let remainder = extract_email(text, &mut result);
        extract_phone(&remainder, awaited == Some(Field::Phone), &mut result);
        extract_experience(text, &mut result);
        extract_name(text, &mut result);
        extract_location(text, &mut result);
        extract_position(text, &mut result);
        extract_tech_stack(text, &mut result);

        if result.is_empty() && !known.is_set(Field::Experience) {
            if let Some(years) = bare_years(text) {
                result.insert(Field::Experience, FieldValue::Years(years), HEURISTIC);
            }
        }

        if result.is_empty()
            && let Some(field) = awaited
            && let Some(value) = bare_answer(field, text, known)
        {
            result.insert(field, value, HEURISTIC);
        }

        debug!(fields = ?result.fields(), awaited = ?awaited, "Local extraction finished");
        result
    }
}

/// Extract an email-looking token. Malformed addresses are still proposed so
/// the validator can reject them. Returns the text with email tokens blanked.
fn extract_email(text: &str, result: &mut ExtractionResult) -> String {
    if let Some(m) = EMAIL_CANDIDATE_RE.find(text) {
        let candidate = m.as_str().trim_end_matches(['.', '!', '?', ':', '\'', '"']);
        result.insert(Field::Email, FieldValue::Text(candidate.to_string()), EXACT);
    }
    EMAIL_CANDIDATE_RE.replace_all(text, " ").into_owned()
}

fn extract_phone(text: &str, awaited: bool, result: &mut ExtractionResult) {
    let labelled = PHONE_LABEL_RE.is_match(text);
    for m in PHONE_CANDIDATE_RE.find_iter(text) {
        let candidate = m.as_str().trim();
        let digits = candidate.chars().filter(char::is_ascii_digit).count();
        if !(7..=15).contains(&digits) {
            continue;
        }
        if labelled || awaited || digits >= 10 {
            result.insert(Field::Phone, FieldValue::Text(candidate.to_string()), EXACT);
            return;
        }
    }
}

fn extract_experience(text: &str, result: &mut ExtractionResult) {
    for caps in YEARS_RE.captures_iter(text) {
        if caps.name("rest").is_some() {
            continue;
        }
        if let Some(years) = caps.name("n").and_then(|n| n.as_str().parse::<f32>().ok()) {
            result.insert(Field::Experience, FieldValue::Years(years), EXACT);
            return;
        }
    }

    if let Some(years) = EXPERIENCE_LABEL_RE
        .captures(text)
        .and_then(|caps| caps.name("n"))
        .and_then(|n| n.as_str().parse::<f32>().ok())
    {
        result.insert(Field::Experience, FieldValue::Years(years), EXACT);
        return;
    }

    for caps in YEARS_WORD_RE.captures_iter(text) {
        if caps.name("rest").is_some() {
            continue;
        }
        if let Some(years) = caps.name("w").and_then(|w| number_word(w.as_str())) {
            result.insert(Field::Experience, FieldValue::Years(years), HEURISTIC);
            return;
        }
    }

    if FRESHER_RE.is_match(text) {
        result.insert(Field::Experience, FieldValue::Years(0.0), HEURISTIC);
    }
}

fn extract_name(text: &str, result: &mut ExtractionResult) {
    if let Some(name) = NAME_LABEL_RE
        .captures(text)
        .and_then(|caps| caps.name("v"))
        .and_then(|v| cut_at_stop_word(v.as_str(), 4))
    {
        result.insert(Field::Name, FieldValue::Text(title_case(&name)), LABELLED);
        return;
    }

    if let Some(name) = NAME_GREETING_RE
        .captures(text)
        .and_then(|caps| caps.name("v"))
        .and_then(|v| cut_at_stop_word(v.as_str(), 3))
    {
        if !is_filler(&name) {
            result.insert(Field::Name, FieldValue::Text(name), HEURISTIC);
        }
    }
}

fn extract_location(text: &str, result: &mut ExtractionResult) {
    if let Some(place) = LOCATION_LABEL_RE
        .captures(text)
        .and_then(|caps| caps.name("v"))
        .and_then(|v| cut_at_stop_word(v.as_str(), 5))
    {
        result.insert(Field::Location, FieldValue::Text(title_case(&place)), LABELLED);
        return;
    }

    if let Some(place) = LOCATION_FROM_RE
        .captures(text)
        .and_then(|caps| caps.name("v"))
        .and_then(|v| cut_at_stop_word(v.as_str(), 5))
    {
        result.insert(Field::Location, FieldValue::Text(title_case(&place)), HEURISTIC);
    }
}

fn extract_position(text: &str, result: &mut ExtractionResult) {
    let labelled = POSITION_LABEL_RE
        .captures(text)
        .or_else(|| POSITION_SEEKING_RE.captures(text))
        .and_then(|caps| caps.name("v"))
        .map(|v| split_positions(v.as_str()));
    if let Some(positions) = labelled.filter(|p| !p.is_empty()) {
        result.insert(Field::DesiredPosition, FieldValue::Positions(positions), LABELLED);
        return;
    }

    if let Some(positions) = POSITION_WANT_RE
        .captures(text)
        .and_then(|caps| caps.name("v"))
        .map(|v| split_positions(v.as_str()))
        .filter(|p| !p.is_empty())
    {
        result.insert(Field::DesiredPosition, FieldValue::Positions(positions), HEURISTIC);
    }
}

fn extract_tech_stack(text: &str, result: &mut ExtractionResult) {
    if let Some(techs) = TECH_LABEL_RE
        .captures(text)
        .and_then(|caps| caps.name("v"))
        .map(|v| split_technologies(v.as_str()))
        .filter(|t| !t.is_empty())
    {
        result.insert(Field::TechStack, FieldValue::Technologies(techs), LABELLED);
        return;
    }

    if let Some(techs) = TECH_USAGE_RE
        .captures(text)
        .and_then(|caps| caps.name("v"))
        .map(|v| split_technologies(v.as_str()))
        .filter(|t| !t.is_empty())
    {
        result.insert(Field::TechStack, FieldValue::Technologies(techs), HEURISTIC);
    }
}

/// Split a technology list on commas, semicolons, slashes, "and", "plus",
/// normalising to lowercase single-spaced tokens.
pub fn split_technologies(raw: &str) -> BTreeSet<String> {
    TECH_SEPARATOR_RE
        .split(raw)
        .map(normalize_token)
        .filter(|t| !t.is_empty())
        .filter(|t| t.split_whitespace().count() <= 4)
        .filter(|t| !matches!(t.as_str(), "etc" | "others" | "more" | "some" | "also" | "many"))
        .collect()
}

fn normalize_token(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
    let collapsed = collapsed
        .trim_start_matches("also ")
        .trim_start_matches("mostly ")
        .trim_end_matches(" etc");
    collapsed
        .trim_matches(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.')))
        .trim_end_matches('.')
        .to_string()
}

pub(crate) fn split_positions(raw: &str) -> Vec<String> {
    let raw = cut_at_any(raw, &[" in ", " at ", " with ", " and i ", " because "]);
    raw.split([',', '/'])
        .flat_map(|part| part.split(" or "))
        .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "))
        .map(|p| p.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|p| !p.is_empty() && p.split_whitespace().count() <= 6)
        .map(|p| title_case(&p))
        .collect()
}

fn bare_years(text: &str) -> Option<f32> {
    let caps = BARE_NUMBER_RE.captures(text.trim())?;
    caps.name("n")?.as_str().parse::<f32>().ok()
}

/// Interpret a whole short utterance as the answer to `field`.
///
/// Hedges ("not sure"), questions and repeats of a value already in the
/// profile are never read as an answer.
fn bare_answer(field: Field, text: &str, known: &CandidateProfile) -> Option<FieldValue> {
    if text.contains('?') {
        return None;
    }
    let lowered = text.to_lowercase();
    let first_word = lowered.split_whitespace().next().unwrap_or_default();
    if QUESTION_WORDS.contains(&first_word) {
        return None;
    }

    let stripped = strip_leading_fillers(text);
    let stripped = stripped.trim_matches(|c: char| c.is_whitespace() || matches!(c, '.' | '!' | ','));
    if stripped.is_empty() || is_filler(stripped) || is_non_answer(stripped) {
        return None;
    }
    if echoes_profile(text, known) || echoes_profile(stripped, known) {
        return None;
    }
    let words = stripped.split_whitespace().count();

    match field {
        Field::Name => {
            let plausible = words <= 4
                && stripped
                    .chars()
                    .all(|c| c.is_alphabetic() || matches!(c, ' ' | '-' | '\'' | '.'));
            plausible.then(|| FieldValue::Text(title_case(stripped)))
        }
        Field::Experience => {
            let first = stripped.split_whitespace().next()?;
            number_word(first)
                .or_else(|| bare_years(stripped))
                .map(FieldValue::Years)
        }
        Field::DesiredPosition => {
            let positions = split_positions(stripped);
            let titled = positions.iter().all(|p| p.chars().any(char::is_alphabetic));
            (!positions.is_empty() && titled && words <= 12)
                .then_some(FieldValue::Positions(positions))
        }
        Field::Location => (words <= 5 && stripped.chars().any(char::is_alphabetic))
            .then(|| FieldValue::Text(title_case(stripped))),
        Field::TechStack => {
            let techs = split_technologies(stripped);
            techs
                .iter()
                .any(|t| is_technology(t))
                .then_some(FieldValue::Technologies(techs))
        }
        // Email and phone are only accepted through their format patterns.
        Field::Email | Field::Phone => None,
    }
}

fn is_non_answer(text: &str) -> bool {
    let first = text
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .trim_matches(|c: char| !(c.is_alphanumeric() || c == '\''))
        .to_lowercase();
    NON_ANSWER_LEADS.contains(&first.as_str())
}

/// A token that names a technology: a known one, or one shaped like a
/// version or package name ("c++", "node.js", "python3").
fn is_technology(token: &str) -> bool {
    KNOWN_TECHNOLOGIES.contains(&token)
        || token
            .chars()
            .any(|c| c.is_ascii_digit() || matches!(c, '+' | '#' | '.'))
}

/// Whether `text` repeats a value the profile already holds.
fn echoes_profile(text: &str, known: &CandidateProfile) -> bool {
    let said = normalize_phrase(text);
    if said.is_empty() {
        return false;
    }
    Field::ALL.iter().any(|field| match known.value(*field) {
        Some(FieldValue::Text(value)) => normalize_phrase(value) == said,
        Some(FieldValue::Positions(positions)) => {
            positions.iter().any(|p| normalize_phrase(p) == said)
                || normalize_phrase(&positions.join(", ")) == said
        }
        Some(FieldValue::Technologies(techs)) => split_technologies(text) == *techs,
        Some(FieldValue::Years(years)) => bare_years(text) == Some(*years),
        None => false,
    })
}

fn normalize_phrase(raw: &str) -> String {
    raw.split_whitespace()
        .map(|w| w.trim_matches(|c: char| matches!(c, '.' | '!' | ',')))
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn strip_leading_fillers(text: &str) -> &str {
    let mut rest = text.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
    for greeting in ["hi", "hello", "hey"] {
        if rest.len() > greeting.len()
            && rest.is_char_boundary(greeting.len())
            && rest[..greeting.len()].eq_ignore_ascii_case(greeting)
            && !rest[greeting.len()..].starts_with(char::is_alphanumeric)
        {
            rest = rest[greeting.len()..].trim_start_matches(|c: char| {
                c.is_whitespace() || matches!(c, ',' | '!' | '.')
            });
        }
    }
    loop {
        let before = rest;
        for filler in LEADING_FILLERS {
            if rest.len() > filler.len()
                && rest.is_char_boundary(filler.len())
                && rest[..filler.len()].eq_ignore_ascii_case(filler)
            {
                rest = &rest[filler.len()..];
            }
        }
        if rest == before {
            return rest;
        }
    }
}

fn is_filler(text: &str) -> bool {
    text.split_whitespace().all(|w| {
        let w = w
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        w.is_empty() || FILLER_WORDS.contains(&w.as_str())
    })
}

/// Keep leading words up to the first stop word, at most `max_words`.
fn cut_at_stop_word(raw: &str, max_words: usize) -> Option<String> {
    let words: Vec<&str> = raw
        .split_whitespace()
        .take_while(|w| !STOP_WORDS.contains(&w.to_lowercase().as_str()))
        .collect();
    if words.is_empty() || words.len() > max_words {
        return None;
    }
    Some(words.join(" "))
}

fn cut_at_any<'a>(raw: &'a str, separators: &[&str]) -> &'a str {
    let lowered = raw.to_lowercase();
    let end = separators
        .iter()
        .filter_map(|sep| lowered.find(sep))
        .min()
        .unwrap_or(raw.len());
    if raw.is_char_boundary(end) { &raw[..end] } else { raw }
}

fn number_word(word: &str) -> Option<f32> {
    let word = word.to_lowercase();
    NUMBER_WORDS
        .iter()
        .find(|(w, _)| *w == word)
        .map(|(_, n)| *n)
}

/// Capitalise words typed entirely in lowercase; leave mixed case alone.
fn title_case(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            if word.chars().any(char::is_uppercase) {
                return word.to_string();
            }
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screening::profile::ProfileEntry;

    fn extract(text: &str) -> ExtractionResult {
        FieldExtractor::new().extract(text, &CandidateProfile::new())
    }

    fn profile_with(fields: &[(Field, FieldValue)]) -> CandidateProfile {
        let mut profile = CandidateProfile::new();
        for (field, value) in fields {
            profile.set(
                *field,
                ProfileEntry {
                    value: value.clone(),
                    confidence: 1.0,
                    updated_turn: 1,
                },
            );
        }
        profile
    }

    fn techs(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn name_and_experience_in_one_utterance() {
        let result = extract("My name is Asha, I have 3 years experience");
        assert_eq!(
            result.get(Field::Name).unwrap().value,
            FieldValue::Text("Asha".into())
        );
        assert_eq!(
            result.get(Field::Experience).unwrap().value,
            FieldValue::Years(3.0)
        );
        assert_eq!(result.get(Field::Experience).unwrap().confidence, EXACT);
    }

    #[test]
    fn email_and_phone_are_exact() {
        let result = extract("reach me at asha.rao@example.com or call +91 98765 43210");
        let email = result.get(Field::Email).unwrap();
        assert_eq!(email.value, FieldValue::Text("asha.rao@example.com".into()));
        assert_eq!(email.confidence, EXACT);
        let phone = result.get(Field::Phone).unwrap();
        assert_eq!(phone.value, FieldValue::Text("+91 98765 43210".into()));
        assert_eq!(phone.confidence, EXACT);
    }

    #[test]
    fn malformed_email_is_still_proposed() {
        let result = extract("asha@@x");
        assert_eq!(
            result.get(Field::Email).unwrap().value,
            FieldValue::Text("asha@@x".into())
        );
    }

    fn all_but_stack() -> CandidateProfile {
        profile_with(&[
            (Field::Name, FieldValue::Text("Asha".into())),
            (Field::Email, FieldValue::Text("asha@example.com".into())),
            (Field::Phone, FieldValue::Text("5551234567".into())),
            (Field::Experience, FieldValue::Years(3.0)),
            (Field::DesiredPosition, FieldValue::Positions(vec!["Backend Engineer".into()])),
            (Field::Location, FieldValue::Text("Pune".into())),
        ])
    }

    #[test]
    fn tech_stack_is_split_and_normalized() {
        let result = FieldExtractor::new().extract("Python, React and Docker", &all_but_stack());
        assert_eq!(
            result.get(Field::TechStack).unwrap().value,
            FieldValue::Technologies(techs(&["python", "react", "docker"]))
        );
    }

    #[test]
    fn labelled_tech_stack_with_odd_separators() {
        let result = extract("My tech stack is  Rust; Node.js / PostgreSQL plus C++");
        assert_eq!(
            result.get(Field::TechStack).unwrap().value,
            FieldValue::Technologies(techs(&["rust", "node.js", "postgresql", "c++"]))
        );
    }

    #[test]
    fn greeting_name_is_heuristic() {
        let result = extract("Hi, I'm Ravi Kumar from Bangalore");
        let name = result.get(Field::Name).unwrap();
        assert_eq!(name.value, FieldValue::Text("Ravi Kumar".into()));
        assert_eq!(name.confidence, HEURISTIC);
        assert_eq!(
            result.get(Field::Location).unwrap().value,
            FieldValue::Text("Bangalore".into())
        );
    }

    #[test]
    fn name_and_location_in_one_sentence() {
        let result = extract("my name is asha rao and I live in new delhi");
        assert_eq!(
            result.get(Field::Name).unwrap().value,
            FieldValue::Text("Asha Rao".into())
        );
        assert_eq!(
            result.get(Field::Location).unwrap().value,
            FieldValue::Text("New Delhi".into())
        );
    }

    #[test]
    fn position_from_seeking_phrase() {
        let result = extract("I'm looking for a Backend Developer or DevOps Engineer role");
        assert_eq!(
            result.get(Field::DesiredPosition).unwrap().value,
            FieldValue::Positions(vec!["Backend Developer".into(), "DevOps Engineer".into()])
        );
    }

    #[test]
    fn age_is_not_experience() {
        let result = extract("I am 25 years old");
        assert!(!result.contains(Field::Experience));
    }

    #[test]
    fn bare_number_is_experience_when_unset() {
        let known = profile_with(&[(Field::Name, FieldValue::Text("Asha".into()))]);
        let result = FieldExtractor::new().extract("5", &known);
        assert_eq!(
            result.get(Field::Experience).unwrap().value,
            FieldValue::Years(5.0)
        );
        assert!(!result.contains(Field::Phone));
    }

    #[test]
    fn bare_number_is_ignored_once_experience_known() {
        let known = profile_with(&[(Field::Experience, FieldValue::Years(2.0))]);
        let result = FieldExtractor::new().extract("5", &known);
        assert!(result.is_empty());
    }

    #[test]
    fn short_phone_number_needs_context() {
        assert!(!extract("we shipped 1234567 units").contains(Field::Phone));
        assert!(extract("my number is 555-1234").contains(Field::Phone));
    }

    #[test]
    fn bare_answer_fills_awaited_field() {
        let result = extract("asha rao");
        let name = result.get(Field::Name).unwrap();
        assert_eq!(name.value, FieldValue::Text("Asha Rao".into()));
        assert_eq!(name.confidence, HEURISTIC);
    }

    #[test]
    fn hedges_are_not_answers() {
        for hedge in ["I don't know", "not sure", "I'm not sure", "I'd rather not say", "skip"] {
            assert!(extract(hedge).is_empty(), "{hedge}");
        }
    }

    #[test]
    fn repeating_a_known_value_is_not_a_new_answer() {
        let known = all_but_stack();
        assert!(FieldExtractor::new().extract("Pune", &known).is_empty());
        assert!(FieldExtractor::new().extract("backend engineer.", &known).is_empty());
        assert!(FieldExtractor::new().extract("3", &known).is_empty());
    }

    #[test]
    fn bare_tech_stack_needs_a_technology() {
        let known = all_but_stack();
        assert!(FieldExtractor::new().extract("Mumbai and Delhi", &known).is_empty());

        let result = FieldExtractor::new().extract("Rust", &known);
        assert_eq!(
            result.get(Field::TechStack).unwrap().value,
            FieldValue::Technologies(techs(&["rust"]))
        );
        let result = FieldExtractor::new().extract("elm, node.js", &known);
        assert_eq!(
            result.get(Field::TechStack).unwrap().value,
            FieldValue::Technologies(techs(&["elm", "node.js"]))
        );
    }

    #[test]
    fn filler_and_questions_yield_nothing() {
        assert!(extract("hmm ok").is_empty());
        assert!(extract("what do you mean?").is_empty());
        assert!(extract("hello").is_empty());
        assert!(extract("   ").is_empty());
    }

    #[test]
    fn number_words_for_experience() {
        let result = extract("I have two years of experience");
        assert_eq!(
            result.get(Field::Experience).unwrap().value,
            FieldValue::Years(2.0)
        );
    }

    #[test]
    fn fresher_means_zero_years() {
        let result = extract("I'm a fresher");
        assert_eq!(
            result.get(Field::Experience).unwrap().value,
            FieldValue::Years(0.0)
        );
    }

    #[test]
    fn insert_keeps_more_confident_proposal() {
        let mut result = ExtractionResult::new();
        result.insert(Field::Name, FieldValue::Text("A".into()), EXACT);
        result.insert(Field::Name, FieldValue::Text("B".into()), HEURISTIC);
        assert_eq!(result.get(Field::Name).unwrap().value, FieldValue::Text("A".into()));
        assert_eq!(result.len(), 1);
    }
}
