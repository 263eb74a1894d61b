//! Candidate profile: the required fields, their values and validators.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$").unwrap()
});

/// Upper bound accepted for years of experience.
const MAX_YEARS: f32 = 60.0;

/// A required candidate attribute.
///
/// Variant order is the canonical priority order used when deciding which
/// missing field to ask for next.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Email,
    Phone,
    Experience,
    DesiredPosition,
    Location,
    TechStack,
}

impl Field {
    /// All fields in canonical priority order.
    pub const ALL: [Field; 7] = [
        Field::Name,
        Field::Email,
        Field::Phone,
        Field::Experience,
        Field::DesiredPosition,
        Field::Location,
        Field::TechStack,
    ];

    /// Human-readable label used in prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Name => "full name",
            Self::Email => "email address",
            Self::Phone => "phone number",
            Self::Experience => "years of experience",
            Self::DesiredPosition => "desired position",
            Self::Location => "current location",
            Self::TechStack => "tech stack",
        }
    }

    /// Map a key from model output to a field. Accepts a few common aliases.
    pub fn from_key(key: &str) -> Option<Field> {
        match key.trim().to_lowercase().as_str() {
            "name" | "full_name" => Some(Self::Name),
            "email" | "email_address" => Some(Self::Email),
            "phone" | "phone_number" => Some(Self::Phone),
            "experience" | "years_of_experience" => Some(Self::Experience),
            "desired_position" | "desired_positions" | "position" => Some(Self::DesiredPosition),
            "location" | "current_location" => Some(Self::Location),
            "tech_stack" | "technologies" => Some(Self::TechStack),
            _ => None,
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Experience => "experience",
            Self::DesiredPosition => "desired_position",
            Self::Location => "location",
            Self::TechStack => "tech_stack",
        };
        write!(f, "{s}")
    }
}

/// A field value. The variant depends on the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Years(f32),
    Positions(Vec<String>),
    Technologies(BTreeSet<String>),
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::Years(_) => false,
            Self::Positions(p) => p.is_empty(),
            Self::Technologies(t) => t.is_empty(),
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::Years(y) if y.fract() == 0.0 => write!(f, "{}", *y as u32),
            Self::Years(y) => write!(f, "{y}"),
            Self::Positions(p) => write!(f, "{}", p.join(", ")),
            Self::Technologies(t) => {
                let joined: Vec<&str> = t.iter().map(String::as_str).collect();
                write!(f, "{}", joined.join(", "))
            }
        }
    }
}

/// A value that failed its field validator.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFailure {
    pub field: Field,
    pub reason: &'static str,
}

/// Check a proposed value against its field's validator.
pub fn validate(field: Field, value: &FieldValue) -> Result<(), ValidationFailure> {
    let fail = |reason| Err(ValidationFailure { field, reason });

    if value.is_empty() {
        return fail("value is empty");
    }

    match (field, value) {
        (Field::Name, FieldValue::Text(name)) => {
            let name = name.trim();
            if name.chars().count() > 80 || name.split_whitespace().count() > 5 {
                return fail("name is too long");
            }
            if !name.chars().any(char::is_alphabetic) {
                return fail("name has no letters");
            }
            if !name
                .chars()
                .all(|c| c.is_alphabetic() || matches!(c, ' ' | '-' | '\'' | '.'))
            {
                return fail("name contains unexpected characters");
            }
            Ok(())
        }
        (Field::Email, FieldValue::Text(email)) => {
            if EMAIL_RE.is_match(email.trim()) {
                Ok(())
            } else {
                fail("email is not a valid address")
            }
        }
        (Field::Phone, FieldValue::Text(phone)) => {
            let phone = phone.trim();
            if !phone
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')' | '.' | '+'))
            {
                return fail("phone contains unexpected characters");
            }
            if phone.rfind('+').is_some_and(|idx| idx != 0) {
                return fail("plus sign is only allowed as a country code prefix");
            }
            let digits = phone.chars().filter(char::is_ascii_digit).count();
            if (7..=15).contains(&digits) {
                Ok(())
            } else {
                fail("phone must have between 7 and 15 digits")
            }
        }
        (Field::Experience, FieldValue::Years(years)) => {
            if years.is_finite() && (0.0..=MAX_YEARS).contains(years) {
                Ok(())
            } else {
                fail("years of experience must be a non-negative number")
            }
        }
        (Field::DesiredPosition, FieldValue::Positions(positions)) => {
            if positions
                .iter()
                .all(|p| !p.trim().is_empty() && p.chars().count() <= 80)
            {
                Ok(())
            } else {
                fail("position entries must be short, non-empty titles")
            }
        }
        (Field::Location, FieldValue::Text(location)) => {
            if location.chars().count() <= 100 && location.chars().any(char::is_alphabetic) {
                Ok(())
            } else {
                fail("location is not recognisable")
            }
        }
        (Field::TechStack, FieldValue::Technologies(techs)) => {
            if techs.iter().all(|t| !t.trim().is_empty()) {
                Ok(())
            } else {
                fail("tech stack contains an empty entry")
            }
        }
        _ => fail("value kind does not match field"),
    }
}

/// A recorded field value with the confidence and turn it was set at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileEntry {
    pub value: FieldValue,
    pub confidence: f32,
    pub updated_turn: u32,
}

/// Everything known about the candidate so far. Every field starts unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    #[serde(default)]
    entries: BTreeMap<Field, ProfileEntry>,
}

impl CandidateProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: Field) -> Option<&ProfileEntry> {
        self.entries.get(&field)
    }

    pub fn value(&self, field: Field) -> Option<&FieldValue> {
        self.entries.get(&field).map(|e| &e.value)
    }

    pub fn is_set(&self, field: Field) -> bool {
        self.entries.contains_key(&field)
    }

    /// Confidence recorded for a field, or 0.0 when unset.
    pub fn confidence(&self, field: Field) -> f32 {
        self.entries.get(&field).map(|e| e.confidence).unwrap_or(0.0)
    }

    pub(crate) fn set(&mut self, field: Field, entry: ProfileEntry) {
        self.entries.insert(field, entry);
    }

    pub fn years_of_experience(&self) -> Option<f32> {
        match self.value(Field::Experience) {
            Some(FieldValue::Years(y)) => Some(*y),
            _ => None,
        }
    }

    pub fn tech_stack(&self) -> Option<&BTreeSet<String>> {
        match self.value(Field::TechStack) {
            Some(FieldValue::Technologies(t)) => Some(t),
            _ => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self.value(Field::Name) {
            Some(FieldValue::Text(n)) => Some(n),
            _ => None,
        }
    }

    /// Render collected fields for inclusion in a model prompt.
    pub fn to_prompt_section(&self) -> String {
        Field::ALL
            .iter()
            .map(|field| match self.value(*field) {
                Some(value) => format!("{field}: {value}"),
                None => format!("{field}: unknown"),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// A copy of the profile with personal identifiers masked, safe to log.
    pub fn anonymized(&self, conversation_id: Uuid) -> AnonymizedProfile {
        let anonymous_id = conversation_id.simple().to_string()[..10].to_string();
        let fields = self
            .entries
            .iter()
            .map(|(field, entry)| {
                let shown = match field {
                    Field::Name => format!("Candidate-{anonymous_id}"),
                    Field::Email => mask_email(&entry.value.to_string()),
                    Field::Phone => mask_phone(&entry.value.to_string()),
                    _ => entry.value.to_string(),
                };
                (*field, shown)
            })
            .collect();
        AnonymizedProfile {
            anonymous_id,
            fields,
        }
    }
}

/// Profile view with name, email and phone masked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymizedProfile {
    pub anonymous_id: String,
    pub fields: BTreeMap<Field, String>,
}

fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let chars: Vec<char> = local.chars().collect();
            let masked_local = if chars.len() <= 2 {
                "*".repeat(chars.len())
            } else {
                format!(
                    "{}{}{}",
                    chars[0],
                    "*".repeat(chars.len() - 2),
                    chars[chars.len() - 1]
                )
            };
            format!("{masked_local}@{domain}")
        }
        None => "*".repeat(email.chars().count()),
    }
}

fn mask_phone(phone: &str) -> String {
    let digits: Vec<char> = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.len() <= 2 {
        return digits.into_iter().collect();
    }
    let visible: String = digits[digits.len() - 2..].iter().collect();
    format!("{}{}", "*".repeat(digits.len() - 2), visible)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }

    #[test]
    fn field_order_is_canonical() {
        let mut shuffled = vec![Field::TechStack, Field::Email, Field::Location, Field::Name];
        shuffled.sort();
        assert_eq!(
            shuffled,
            vec![Field::Name, Field::Email, Field::Location, Field::TechStack]
        );
    }

    #[test]
    fn display_matches_serde() {
        for field in Field::ALL {
            let json = serde_json::to_string(&field).unwrap();
            assert_eq!(format!("\"{field}\""), json);
            assert_eq!(Field::from_key(&field.to_string()), Some(field));
        }
    }

    #[test]
    fn email_validator() {
        assert!(validate(Field::Email, &text("asha@example.com")).is_ok());
        assert!(validate(Field::Email, &text("a.b+c@mail.co.in")).is_ok());
        assert!(validate(Field::Email, &text("asha@@x")).is_err());
        assert!(validate(Field::Email, &text("asha@example")).is_err());
        assert!(validate(Field::Email, &text("")).is_err());
    }

    #[test]
    fn phone_validator() {
        assert!(validate(Field::Phone, &text("+91 98765 43210")).is_ok());
        assert!(validate(Field::Phone, &text("(555) 123-4567")).is_ok());
        assert!(validate(Field::Phone, &text("12345")).is_err());
        assert!(validate(Field::Phone, &text("555-12+34567")).is_err());
        assert!(validate(Field::Phone, &text("call me")).is_err());
    }

    #[test]
    fn experience_validator() {
        assert!(validate(Field::Experience, &FieldValue::Years(0.0)).is_ok());
        assert!(validate(Field::Experience, &FieldValue::Years(3.5)).is_ok());
        assert!(validate(Field::Experience, &FieldValue::Years(-1.0)).is_err());
        assert!(validate(Field::Experience, &FieldValue::Years(f32::NAN)).is_err());
    }

    #[test]
    fn name_validator() {
        assert!(validate(Field::Name, &text("Asha Rao")).is_ok());
        assert!(validate(Field::Name, &text("O'Neil-Smith")).is_ok());
        assert!(validate(Field::Name, &text("R2D2")).is_err());
        assert!(validate(Field::Name, &text("   ")).is_err());
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let err = validate(Field::Experience, &text("three")).unwrap_err();
        assert_eq!(err.field, Field::Experience);
    }

    #[test]
    fn empty_tech_stack_is_rejected() {
        assert!(validate(Field::TechStack, &FieldValue::Technologies(BTreeSet::new())).is_err());
    }

    #[test]
    fn years_display_drops_trailing_zero() {
        assert_eq!(FieldValue::Years(3.0).to_string(), "3");
        assert_eq!(FieldValue::Years(2.5).to_string(), "2.5");
    }

    #[test]
    fn anonymized_masks_identifiers() {
        let mut profile = CandidateProfile::new();
        let entry = |value| ProfileEntry {
            value,
            confidence: 1.0,
            updated_turn: 1,
        };
        profile.set(Field::Name, entry(text("Asha Rao")));
        profile.set(Field::Email, entry(text("asha@example.com")));
        profile.set(Field::Phone, entry(text("+1 555 000 1234")));
        profile.set(Field::Location, entry(text("Pune")));

        let anon = profile.anonymized(Uuid::new_v4());
        assert_eq!(anon.anonymous_id.len(), 10);
        assert!(anon.fields[&Field::Name].starts_with("Candidate-"));
        assert_eq!(anon.fields[&Field::Email], "a**a@example.com");
        assert_eq!(anon.fields[&Field::Phone], "*********34");
        assert_eq!(anon.fields[&Field::Location], "Pune");
    }

    #[test]
    fn profile_serde_roundtrip() {
        let mut profile = CandidateProfile::new();
        profile.set(
            Field::TechStack,
            ProfileEntry {
                value: FieldValue::Technologies(
                    ["python", "docker"].iter().map(|s| s.to_string()).collect(),
                ),
                confidence: 0.5,
                updated_turn: 4,
            },
        );
        profile.set(
            Field::Experience,
            ProfileEntry {
                value: FieldValue::Years(3.0),
                confidence: 1.0,
                updated_turn: 2,
            },
        );

        let json = serde_json::to_string(&profile).unwrap();
        let parsed: CandidateProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, profile);
        assert_eq!(parsed.years_of_experience(), Some(3.0));
    }

    #[test]
    fn prompt_section_lists_unknown_fields() {
        let profile = CandidateProfile::new();
        let section = profile.to_prompt_section();
        assert!(section.contains("name: unknown"));
        assert!(section.contains("tech_stack: unknown"));
    }
}
