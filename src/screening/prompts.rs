//! Candidate-facing texts and the prompts sent to the language model.

use crate::llm::ChatMessage;

use super::profile::{CandidateProfile, Field};
use super::questions::{QuestionRequest, QuestionSet, GENERAL_TOPIC};

pub const ASSISTANT_NAME: &str = "TalentScout Hiring Assistant";

const PRIVACY_NOTICE: &str = "Your details are used only for recruitment purposes and are \
     stored securely. Personal identifiers are masked in our logs.";

// ── Candidate-facing texts ──────────────────────────────────────────

/// Greeting sent on the first turn, before asking for `first`.
pub fn introduction(first: Option<Field>) -> String {
    let mut text = format!(
        "Hello! I'm the {ASSISTANT_NAME}. I'll gather some information about your profile \
         and ask a few technical questions to match you with the right opportunities.\n\n\
         {PRIVACY_NOTICE}"
    );
    if let Some(field) = first {
        text.push_str("\n\n");
        text.push_str(field_question(field));
    }
    text
}

/// The plain question for a field.
pub fn field_question(field: Field) -> &'static str {
    match field {
        Field::Name => "Could you tell me your full name?",
        Field::Email => "What's the best email address to reach you at?",
        Field::Phone => "What's your phone number?",
        Field::Experience => "How many years of professional experience do you have?",
        Field::DesiredPosition => "Which position or positions are you interested in?",
        Field::Location => "Where are you currently located?",
        Field::TechStack => {
            "Please list your tech stack: the programming languages, frameworks, \
             databases and tools you work with."
        }
    }
}

/// Ask for the next field after the candidate gave us something new.
pub fn next_field_prompt(profile: &CandidateProfile, field: Field) -> String {
    match profile.name() {
        Some(name) if field != Field::Name => {
            let first = name.split_whitespace().next().unwrap_or(name);
            format!("Thanks, {first}! {}", field_question(field))
        }
        _ => format!("Thanks! {}", field_question(field)),
    }
}

/// Re-prompt when nothing could be understood in the last message.
pub fn fallback_prompt(field: Field) -> String {
    let hint = match field {
        Field::Name => "Just your first and last name is fine.",
        Field::Email => "For example: name@example.com.",
        Field::Phone => "Digits with an optional country code, like +1 555 010 9999.",
        Field::Experience => "A number of years is enough, for example \"3 years\".",
        Field::DesiredPosition => "For example: \"Backend Engineer\" or \"Data Scientist\".",
        Field::Location => "City and country is enough.",
        Field::TechStack => "For example: \"Python, React and Docker\".",
    };
    format!(
        "Sorry, I didn't quite catch that. {} {hint}",
        field_question(field)
    )
}

/// Targeted prompt after a value failed its validator.
pub fn correction_prompt(field: Field) -> String {
    match field {
        Field::Email => "That email address doesn't look quite right. Could you double-check it? \
             It should look like name@example.com."
            .to_string(),
        Field::Phone => "That phone number doesn't look quite right. Please share 7 to 15 digits, \
             optionally starting with a country code such as +91."
            .to_string(),
        Field::Experience => "I couldn't read that as years of experience. Could you give me a \
             number of years, for example 3?"
            .to_string(),
        Field::Name => "Could you give me your full name as it should appear on your application?"
            .to_string(),
        other => format!(
            "Sorry, that doesn't look like a valid {}. {}",
            other.label(),
            field_question(other)
        ),
    }
}

/// Shown when the language model could not be reached.
pub fn retry_later() -> &'static str {
    "Thanks for your patience! I'm having trouble preparing your technical questions right \
     now. Send me any message and I'll try again."
}

pub fn answer_acknowledgement() -> &'static str {
    "Thank you, I've noted your answer. Feel free to answer another question, \
     or say goodbye when you're done."
}

/// Shown when every field is collected but no question generator is available.
pub fn profile_complete(request: &QuestionRequest) -> String {
    format!(
        "Thanks, that's everything I need! Our team will follow up with technical questions \
         on {}.",
        request.technologies.join(", ")
    )
}

/// Closing summary, emitted once when the conversation ends.
pub fn closing_summary(profile: &CandidateProfile, answered: usize) -> String {
    let greeting = match profile.name() {
        Some(name) => format!("Thank you for chatting with the {ASSISTANT_NAME}, {name}!"),
        None => format!("Thank you for chatting with the {ASSISTANT_NAME}!"),
    };
    let collected = Field::ALL.iter().filter(|f| profile.is_set(**f)).count();
    let body = if collected == 0 {
        "You're welcome to come back whenever you're ready to share your profile.".to_string()
    } else if answered > 0 {
        format!(
            "We've recorded your profile and {answered} answer{}. Our recruitment team will \
             review them and get back to you soon.",
            if answered == 1 { "" } else { "s" }
        )
    } else {
        "Your information has been saved. Our recruitment team will review your profile \
         and get back to you soon."
            .to_string()
    };
    format!("{greeting} {body} Have a great day!")
}

/// Render generated questions for the candidate, numbered from 1.
pub fn questions_message(set: &QuestionSet) -> String {
    let mut text = String::from("### Based on your tech stack, here are some technical questions:\n\n");
    let grouped = !(set.by_technology.len() == 1 && set.by_technology.contains_key(GENERAL_TOPIC));
    let mut n = 0;
    for (tech, questions) in &set.by_technology {
        if grouped {
            text.push_str(&format!("**{tech}**\n\n"));
        }
        for question in questions {
            n += 1;
            text.push_str(&format!("{n}. {question}\n\n"));
        }
    }
    text.push_str(
        "Please answer in your own words, one message per answer. \
         Say goodbye whenever you'd like to finish.",
    );
    text
}

// ── Model prompts ───────────────────────────────────────────────────

/// System prompt for field extraction.
pub fn extraction_system_prompt() -> String {
    "You are a hiring assistant for TalentScout, a recruitment agency specializing in \
     technology placements. Extract candidate details from the conversation.\n\n\
     Respond with ONLY a JSON object:\n\
     {\"candidate_info\": {\"name\": null, \"email\": null, \"phone\": null, \"experience\": null, \
     \"desired_position\": null, \"location\": null, \"tech_stack\": null}, \
     \"response\": \"...\", \"generate_technical_questions\": false}\n\n\
     Rules:\n\
     - Use null for anything the candidate has not said\n\
     - experience is a number of years\n\
     - tech_stack is a comma-separated list of technologies\n\
     - Extract information even if it answers a different question than the one asked"
        .to_string()
}

/// User prompt for field extraction.
pub fn extraction_prompt(
    history: &[ChatMessage],
    profile: &CandidateProfile,
    utterance: &str,
    next: Option<Field>,
) -> String {
    let mut prompt = String::with_capacity(1024);

    prompt.push_str("# Current conversation:\n");
    for msg in history {
        let preview: String = msg.content.chars().take(500).collect();
        prompt.push_str(&format!("{}: {}\n", msg.role.to_string().to_uppercase(), preview));
    }

    prompt.push_str("\n# Current collected information:\n");
    prompt.push_str(&profile.to_prompt_section());

    let latest: String = utterance.chars().take(1000).collect();
    prompt.push_str(&format!("\n\n# Latest user input:\n{latest}\n\n"));

    match next {
        Some(field) => prompt.push_str(&format!("# Next information to collect: {field}\n")),
        None => prompt.push_str("# Next information to collect: None - all information collected\n"),
    }
    prompt
}

/// User prompt asking for technical questions.
pub fn question_generation_prompt(request: &QuestionRequest) -> String {
    format!(
        "Generate {min}-{max} technical interview questions for EACH of the following \
         technologies: {techs}.\n\n\
         The candidate has {years} years of experience ({bracket}), so aim for {difficulty} \
         difficulty: core concepts, practical applications and, where appropriate, advanced topics.\n\n\
         Respond with ONLY a JSON object with a single \"questions\" field mapping each technology \
         to an array of question strings. Do NOT number the questions.\n\
         Example: {{\"questions\": {{\"python\": [\"Explain the difference between a list and a tuple.\"]}}}}",
        min = request.min_per_technology,
        max = request.max_per_technology,
        techs = request.technologies.join(", "),
        years = request.years_of_experience,
        bracket = request.bracket.label(),
        difficulty = request.bracket.difficulty(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::screening::extractor::{ExtractionResult, LABELLED};
    use crate::screening::profile::FieldValue;
    use crate::screening::questions::ExperienceBracket;
    use crate::screening::slots;

    fn named(name: &str) -> CandidateProfile {
        let mut result = ExtractionResult::new();
        result.insert(Field::Name, FieldValue::Text(name.to_string()), LABELLED);
        slots::merge(&CandidateProfile::new(), &result, 1)
    }

    #[test]
    fn introduction_asks_for_first_field() {
        let text = introduction(Some(Field::Name));
        assert!(text.contains(ASSISTANT_NAME));
        assert!(text.contains("recruitment purposes"));
        assert!(text.ends_with(field_question(Field::Name)));
    }

    #[test]
    fn next_field_prompt_uses_first_name() {
        let text = next_field_prompt(&named("Asha Rao"), Field::Email);
        assert!(text.starts_with("Thanks, Asha!"));
        assert!(text.contains("email"));
    }

    #[test]
    fn closing_summary_variants() {
        let empty = closing_summary(&CandidateProfile::new(), 0);
        assert!(empty.contains("come back"));

        let saved = closing_summary(&named("Asha Rao"), 0);
        assert!(saved.contains("Asha Rao"));
        assert!(saved.contains("recruitment team"));

        let answered = closing_summary(&named("Asha Rao"), 2);
        assert!(answered.contains("2 answers"));
    }

    #[test]
    fn questions_are_renumbered_across_groups() {
        let mut by_technology = BTreeMap::new();
        by_technology.insert("docker".to_string(), vec!["What is a layer?".to_string()]);
        by_technology.insert(
            "python".to_string(),
            vec!["What is a generator?".to_string(), "Explain the GIL.".to_string()],
        );
        let set = QuestionSet {
            bracket: ExperienceBracket::Mid,
            by_technology,
        };

        let text = questions_message(&set);
        assert!(text.starts_with("### Based on your tech stack"));
        assert!(text.contains("**docker**"));
        assert!(text.contains("1. What is a layer?"));
        assert!(text.contains("3. Explain the GIL."));
    }

    #[test]
    fn ungrouped_questions_have_no_heading() {
        let mut by_technology = BTreeMap::new();
        by_technology.insert(GENERAL_TOPIC.to_string(), vec!["Q?".to_string()]);
        let set = QuestionSet {
            bracket: ExperienceBracket::Junior,
            by_technology,
        };
        assert!(!questions_message(&set).contains("**general**"));
    }

    #[test]
    fn extraction_prompt_includes_context() {
        let history = vec![
            ChatMessage::assistant("What's your phone number?"),
            ChatMessage::user("sure"),
        ];
        let prompt = extraction_prompt(&history, &named("Asha"), "it's 98765 43210", Some(Field::Phone));
        assert!(prompt.contains("ASSISTANT: What's your phone number?"));
        assert!(prompt.contains("name: Asha"));
        assert!(prompt.contains("email: unknown"));
        assert!(prompt.contains("98765 43210"));
        assert!(prompt.contains("Next information to collect: phone"));
    }

    #[test]
    fn question_prompt_mentions_bracket() {
        let request = QuestionRequest {
            technologies: vec!["go".into(), "rust".into()],
            years_of_experience: 7.0,
            bracket: ExperienceBracket::Senior,
            min_per_technology: 3,
            max_per_technology: 5,
        };
        let prompt = question_generation_prompt(&request);
        assert!(prompt.contains("3-5"));
        assert!(prompt.contains("go, rust"));
        assert!(prompt.contains("5+ years"));
        assert!(prompt.contains("advanced"));
    }
}
