//! Conversation controller: drives one screening conversation turn by turn.
//!
//! Every utterance goes through exit detection first, then local extraction
//! (with optional remote enrichment), a merge into the profile, and finally
//! a decision about what to say next.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ScreeningConfig;
use crate::error::ConversationError;
use crate::llm::LlmProvider;

use super::exit::ExitDetector;
use super::extractor::FieldExtractor;
use super::profile::Field;
use super::prompts;
use super::questions::{QuestionGenerator, QuestionRequest};
use super::remote::RemoteExtractor;
use super::slots::{self, SlotState};
use super::state::{ConversationPhase, ConversationState};

/// What the controller did with a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnKind {
    /// First turn: introduction plus the first request.
    Introduction,
    /// Asking for the next missing field.
    Prompt { field: Field },
    /// Nothing recognisable in the utterance; re-asking for the same field.
    Fallback { field: Field },
    /// A value failed its validator; asking for it again.
    Correction { field: Field },
    /// All fields collected and technical questions delivered.
    QuestionsGenerated,
    /// All fields collected but no question generator is configured.
    ProfileComplete,
    /// Question generation failed; it will be retried next turn.
    RetryLater,
    /// An answer to a technical question was recorded.
    AnswerRecorded,
    /// The conversation ended and the closing summary was emitted.
    Closed,
    /// The conversation was ended while this turn was waiting on the model.
    Cancelled,
}

/// Event handed to the presentation layer after each turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnEvent {
    pub prompt_text: String,
    pub phase: ConversationPhase,
    pub slot_completion_ratio: f32,
    pub kind: TurnKind,
}

impl TurnEvent {
    fn new(state: &ConversationState, kind: TurnKind, prompt_text: String) -> Self {
        Self {
            prompt_text,
            phase: state.phase,
            slot_completion_ratio: slots::completion_ratio(&state.profile),
            kind,
        }
    }
}

/// Read-only view of a conversation's collected information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub conversation_id: Uuid,
    pub phase: ConversationPhase,
    pub turn: u32,
    pub slots: Vec<SlotState>,
    pub completion_ratio: f32,
    pub questions_generated: bool,
}

impl ProfileSnapshot {
    pub fn of(state: &ConversationState) -> Self {
        Self {
            conversation_id: state.id,
            phase: state.phase,
            turn: state.turn,
            slots: slots::slot_states(&state.profile),
            completion_ratio: slots::completion_ratio(&state.profile),
            questions_generated: state.questions_generated,
        }
    }
}

/// Stateless driver shared by every conversation. All per-conversation data
/// lives in the `ConversationState` passed to each call.
pub struct ConversationController {
    config: ScreeningConfig,
    extractor: FieldExtractor,
    exit: ExitDetector,
    questions: Option<QuestionGenerator>,
    remote: Option<RemoteExtractor>,
}

impl ConversationController {
    /// Create a controller. Without a provider, extraction is local only and
    /// a completed profile ends in `ProfileComplete` instead of questions.
    pub fn new(config: ScreeningConfig, llm: Option<Arc<dyn LlmProvider>>) -> Self {
        let questions = llm
            .as_ref()
            .map(|llm| QuestionGenerator::new(Arc::clone(llm), config.llm_timeout));
        let remote = llm.filter(|_| config.remote_extraction).map(|llm| {
            RemoteExtractor::new(llm, config.llm_timeout, config.history_window)
        });
        Self {
            exit: ExitDetector::new(config.exit_keywords.as_slice()),
            extractor: FieldExtractor::new(),
            questions,
            remote,
            config,
        }
    }

    pub fn config(&self) -> &ScreeningConfig {
        &self.config
    }

    /// Process one candidate utterance.
    pub async fn handle_turn(
        &self,
        state: &mut ConversationState,
        utterance: &str,
    ) -> Result<TurnEvent, ConversationError> {
        let never = AtomicBool::new(false);
        self.handle_turn_cancellable(state, utterance, &never).await
    }

    /// Process one candidate utterance. If `aborted` is set while the turn
    /// waits on the language model, the model's result is discarded and the
    /// turn reports `Cancelled`.
    pub async fn handle_turn_cancellable(
        &self,
        state: &mut ConversationState,
        utterance: &str,
        aborted: &AtomicBool,
    ) -> Result<TurnEvent, ConversationError> {
        let turn = state.begin_turn()?;
        let utterance = utterance.trim();
        debug!(conversation_id = %state.id, turn, phase = %state.phase, "Handling turn");

        if self.exit.is_exit(utterance) {
            info!(conversation_id = %state.id, turn, phase = %state.phase, "Exit requested");
            state.record_candidate(utterance);
            return self.close(state);
        }

        let (kind, text) = match state.phase {
            ConversationPhase::Greeting => {
                state.transition(ConversationPhase::Collecting)?;
                info!(conversation_id = %state.id, "Conversation started");
                let (kind, text) = self.collect(state, utterance, turn, aborted).await?;
                match kind {
                    TurnKind::Cancelled => (kind, text),
                    TurnKind::Fallback { field } => (
                        TurnKind::Introduction,
                        prompts::introduction(Some(field)),
                    ),
                    TurnKind::Prompt { .. } | TurnKind::Correction { .. } => (
                        TurnKind::Introduction,
                        format!("{}\n\n{text}", prompts::introduction(None)),
                    ),
                    other => (
                        other,
                        format!("{}\n\n{text}", prompts::introduction(None)),
                    ),
                }
            }
            ConversationPhase::Collecting => self.collect(state, utterance, turn, aborted).await?,
            ConversationPhase::Questioning => {
                state.answers.push(utterance.to_string());
                debug!(conversation_id = %state.id, answers = state.answers.len(), "Answer recorded");
                (
                    TurnKind::AnswerRecorded,
                    prompts::answer_acknowledgement().to_string(),
                )
            }
            ConversationPhase::Closing => {
                state.record_candidate(utterance);
                return self.close(state);
            }
            ConversationPhase::Ended => return Err(ConversationError::Ended { id: state.id }),
        };

        state.record_candidate(utterance);
        if kind != TurnKind::Cancelled {
            state.record_assistant(&text);
        }
        Ok(TurnEvent::new(state, kind, text))
    }

    /// End the conversation: Closing then Ended, emitting the summary once.
    pub fn close(&self, state: &mut ConversationState) -> Result<TurnEvent, ConversationError> {
        state.ensure_open()?;
        if state.phase != ConversationPhase::Closing {
            state.transition(ConversationPhase::Closing)?;
        }

        let summary = prompts::closing_summary(&state.profile, state.answers.len());
        state.record_assistant(&summary);
        state.transition(ConversationPhase::Ended)?;

        info!(
            conversation_id = %state.id,
            turns = state.turn,
            profile = ?state.profile.anonymized(state.id).fields,
            "Conversation ended"
        );
        Ok(TurnEvent::new(state, TurnKind::Closed, summary))
    }

    /// Extract, merge, and decide the next prompt while collecting fields.
    async fn collect(
        &self,
        state: &mut ConversationState,
        utterance: &str,
        turn: u32,
        aborted: &AtomicBool,
    ) -> Result<(TurnKind, String), ConversationError> {
        let mut result = self.extractor.extract(utterance, &state.profile);

        if result.is_empty()
            && !slots::is_complete(&state.profile)
            && let Some(remote) = &self.remote
        {
            let suggestion = remote.suggest(state, utterance).await;
            if aborted.load(Ordering::SeqCst) {
                debug!(conversation_id = %state.id, "Discarding remote extraction for ended conversation");
                return Ok((TurnKind::Cancelled, String::new()));
            }
            match suggestion {
                Ok(suggested) => result = suggested,
                Err(e) => {
                    warn!(conversation_id = %state.id, error = %e, "Remote extraction unavailable");
                    return Ok((TurnKind::RetryLater, prompts::retry_later().to_string()));
                }
            }
        }

        let report = slots::merge_report(&state.profile, &result, turn);
        if report.changed() {
            debug!(
                conversation_id = %state.id,
                turn,
                updated = ?report.updated,
                "Profile updated"
            );
        }
        state.profile = report.profile;

        if slots::is_complete(&state.profile) {
            return self.trigger_questions(state, aborted).await;
        }

        let missing = slots::missing_fields(&state.profile);
        let Some(next) = missing.first().copied() else {
            return self.trigger_questions(state, aborted).await;
        };

        if let Some(failure) = report
            .rejected
            .iter()
            .find(|f| !slots::is_filled(&state.profile, f.field))
        {
            return Ok((
                TurnKind::Correction {
                    field: failure.field,
                },
                prompts::correction_prompt(failure.field),
            ));
        }

        if result.is_empty() {
            return Ok((
                TurnKind::Fallback { field: next },
                prompts::fallback_prompt(next),
            ));
        }

        let text = if report.updated.is_empty() {
            prompts::field_question(next).to_string()
        } else {
            prompts::next_field_prompt(&state.profile, next)
        };
        Ok((TurnKind::Prompt { field: next }, text))
    }

    /// Fire the question request once. The flag is set before dispatch and
    /// cleared again if the model fails, so the next turn retries.
    async fn trigger_questions(
        &self,
        state: &mut ConversationState,
        aborted: &AtomicBool,
    ) -> Result<(TurnKind, String), ConversationError> {
        if state.questions_generated {
            return Ok((
                TurnKind::RetryLater,
                prompts::retry_later().to_string(),
            ));
        }

        let Some(request) =
            QuestionRequest::from_profile(&state.profile, &self.config.questions_per_technology)
        else {
            return Ok((
                TurnKind::Fallback {
                    field: Field::TechStack,
                },
                prompts::fallback_prompt(Field::TechStack),
            ));
        };

        state.questions_generated = true;
        info!(
            conversation_id = %state.id,
            technologies = request.technologies.len(),
            bracket = ?request.bracket,
            "Profile complete, requesting technical questions"
        );

        let Some(generator) = &self.questions else {
            state.transition(ConversationPhase::Questioning)?;
            return Ok((
                TurnKind::ProfileComplete,
                prompts::profile_complete(&request),
            ));
        };

        let outcome = generator.generate(&request).await;
        if aborted.load(Ordering::SeqCst) {
            debug!(conversation_id = %state.id, "Discarding generated questions for ended conversation");
            return Ok((TurnKind::Cancelled, String::new()));
        }

        match outcome {
            Ok(set) => {
                state.transition(ConversationPhase::Questioning)?;
                info!(
                    conversation_id = %state.id,
                    questions = set.total(),
                    "Technical questions delivered"
                );
                let text = prompts::questions_message(&set);
                state.questions = Some(set);
                Ok((TurnKind::QuestionsGenerated, text))
            }
            Err(e) => {
                warn!(conversation_id = %state.id, error = %e, "Question generation failed, will retry next turn");
                state.questions_generated = false;
                Ok((TurnKind::RetryLater, prompts::retry_later().to_string()))
            }
        }
    }
}
