//! Conversation phases and the per-conversation state object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ConversationError;
use crate::llm::{ChatMessage, Role};

use super::profile::CandidateProfile;
use super::questions::QuestionSet;

/// Phases of a screening conversation.
///
/// Greeting → Collecting → Questioning → Closing → Ended. Closing is
/// reachable from every non-terminal phase when the candidate wants to leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationPhase {
    Greeting,
    Collecting,
    Questioning,
    Closing,
    Ended,
}

impl ConversationPhase {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: ConversationPhase) -> bool {
        use ConversationPhase::*;
        matches!(
            (self, target),
            (Greeting, Collecting)
                | (Collecting, Questioning)
                | (Greeting, Closing)
                | (Collecting, Closing)
                | (Questioning, Closing)
                | (Closing, Ended)
        )
    }

    /// Whether this phase is terminal (no further turns accepted).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ended)
    }
}

impl Default for ConversationPhase {
    fn default() -> Self {
        Self::Greeting
    }
}

impl std::fmt::Display for ConversationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Greeting => "greeting",
            Self::Collecting => "collecting",
            Self::Questioning => "questioning",
            Self::Closing => "closing",
            Self::Ended => "ended",
        };
        write!(f, "{s}")
    }
}

/// One message in the conversation transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub text: String,
}

impl From<&HistoryEntry> for ChatMessage {
    fn from(entry: &HistoryEntry) -> Self {
        ChatMessage {
            role: entry.role,
            content: entry.text.clone(),
        }
    }
}

/// Everything one screening conversation owns.
///
/// Exclusively owned by one session; mutated only by the controller, one
/// turn at a time, and frozen once `terminated` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub id: Uuid,
    pub phase: ConversationPhase,
    pub profile: CandidateProfile,
    /// Number of candidate utterances processed.
    pub turn: u32,
    /// Set at most once, when the question request is dispatched.
    pub questions_generated: bool,
    pub terminated: bool,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questions: Option<QuestionSet>,
    /// Candidate replies received while questioning.
    #[serde(default)]
    pub answers: Vec<String>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new(Uuid::new_v4())
    }
}

impl ConversationState {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            phase: ConversationPhase::default(),
            profile: CandidateProfile::default(),
            turn: 0,
            questions_generated: false,
            terminated: false,
            history: Vec::new(),
            questions: None,
            answers: Vec::new(),
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Reject any mutation once the conversation has ended.
    pub fn ensure_open(&self) -> Result<(), ConversationError> {
        if self.terminated || self.phase.is_terminal() {
            return Err(ConversationError::Ended { id: self.id });
        }
        Ok(())
    }

    /// Move to `target`, enforcing the transition table.
    pub fn transition(&mut self, target: ConversationPhase) -> Result<(), ConversationError> {
        self.ensure_open()?;
        if !self.phase.can_transition_to(target) {
            return Err(ConversationError::InvalidTransition {
                id: self.id,
                from: self.phase,
                to: target,
            });
        }
        self.phase = target;
        if target.is_terminal() {
            self.terminated = true;
            self.ended_at = Some(Utc::now());
        }
        Ok(())
    }

    /// Start a new turn and return its index (1-based).
    pub fn begin_turn(&mut self) -> Result<u32, ConversationError> {
        self.ensure_open()?;
        self.turn += 1;
        Ok(self.turn)
    }

    pub fn record_candidate(&mut self, text: &str) {
        self.history.push(HistoryEntry {
            role: Role::User,
            text: text.to_string(),
        });
    }

    pub fn record_assistant(&mut self, text: &str) {
        self.history.push(HistoryEntry {
            role: Role::Assistant,
            text: text.to_string(),
        });
    }

    /// The most recent `n` transcript entries as chat messages.
    pub fn recent_messages(&self, n: usize) -> Vec<ChatMessage> {
        let start = self.history.len().saturating_sub(n);
        self.history[start..].iter().map(ChatMessage::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transitions() {
        use ConversationPhase::*;
        let transitions = [
            (Greeting, Collecting),
            (Collecting, Questioning),
            (Greeting, Closing),
            (Collecting, Closing),
            (Questioning, Closing),
            (Closing, Ended),
        ];
        for (from, to) in transitions {
            assert!(from.can_transition_to(to), "{from} should transition to {to}");
        }
    }

    #[test]
    fn invalid_transitions() {
        use ConversationPhase::*;
        // Skip phases
        assert!(!Greeting.can_transition_to(Questioning));
        assert!(!Collecting.can_transition_to(Ended));
        // Go backward
        assert!(!Questioning.can_transition_to(Collecting));
        // Terminal
        assert!(!Ended.can_transition_to(Closing));
        // Self-transition
        assert!(!Collecting.can_transition_to(Collecting));
    }

    #[test]
    fn display_matches_serde() {
        use ConversationPhase::*;
        for phase in [Greeting, Collecting, Questioning, Closing, Ended] {
            let json = serde_json::to_string(&phase).unwrap();
            assert_eq!(format!("\"{phase}\""), json);
        }
    }

    #[test]
    fn reaching_ended_terminates() {
        let mut state = ConversationState::default();
        state.transition(ConversationPhase::Closing).unwrap();
        assert!(!state.terminated);
        state.transition(ConversationPhase::Ended).unwrap();
        assert!(state.terminated);
        assert!(state.ended_at.is_some());

        assert!(matches!(
            state.begin_turn(),
            Err(ConversationError::Ended { .. })
        ));
        assert!(matches!(
            state.transition(ConversationPhase::Closing),
            Err(ConversationError::Ended { .. })
        ));
    }

    #[test]
    fn invalid_transition_is_reported() {
        let mut state = ConversationState::default();
        let err = state.transition(ConversationPhase::Questioning).unwrap_err();
        assert!(matches!(
            err,
            ConversationError::InvalidTransition {
                from: ConversationPhase::Greeting,
                to: ConversationPhase::Questioning,
                ..
            }
        ));
        assert_eq!(state.phase, ConversationPhase::Greeting);
    }

    #[test]
    fn recent_messages_window() {
        let mut state = ConversationState::default();
        state.record_assistant("hello");
        state.record_candidate("hi, I'm Asha");
        state.record_assistant("nice to meet you");

        let recent = state.recent_messages(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].role, Role::User);
        assert_eq!(recent[1].content, "nice to meet you");
        assert_eq!(state.recent_messages(10).len(), 3);
    }

    #[test]
    fn state_serde_roundtrip() {
        let mut state = ConversationState::default();
        state.transition(ConversationPhase::Collecting).unwrap();
        state.begin_turn().unwrap();
        state.questions_generated = true;

        let json = serde_json::to_string(&state).unwrap();
        let parsed: ConversationState = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.id, state.id);
        assert_eq!(parsed.phase, ConversationPhase::Collecting);
        assert_eq!(parsed.turn, 1);
        assert!(parsed.questions_generated);
        assert!(!parsed.terminated);
        assert_eq!(parsed.profile, state.profile);
    }
}
