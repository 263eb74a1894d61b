//! Slot tracking: which required fields are filled, and confidence-arbitrated merging.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::extractor::ExtractionResult;
use super::profile::{validate, CandidateProfile, Field, ProfileEntry, ValidationFailure};

/// Fill status of one required field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotState {
    pub field: Field,
    /// True iff the profile holds a non-empty value that passes the field validator.
    pub filled: bool,
    pub updated_turn: Option<u32>,
    pub confidence: f32,
}

/// Outcome of merging one extraction into a profile.
#[derive(Debug, Clone)]
pub struct MergeReport {
    pub profile: CandidateProfile,
    /// Fields whose value changed.
    pub updated: Vec<Field>,
    /// Proposals that failed their validator. The field is left as it was.
    pub rejected: Vec<ValidationFailure>,
    /// Proposals dropped because a more confident value is already recorded.
    pub discarded: Vec<Field>,
}

impl MergeReport {
    pub fn changed(&self) -> bool {
        !self.updated.is_empty()
    }
}

/// Whether `field` currently holds a valid value.
pub fn is_filled(profile: &CandidateProfile, field: Field) -> bool {
    profile
        .value(field)
        .is_some_and(|value| validate(field, value).is_ok())
}

/// Fill status of every required field, in canonical order.
pub fn slot_states(profile: &CandidateProfile) -> Vec<SlotState> {
    Field::ALL
        .iter()
        .map(|field| SlotState {
            field: *field,
            filled: is_filled(profile, *field),
            updated_turn: profile.get(*field).map(|e| e.updated_turn),
            confidence: profile.confidence(*field),
        })
        .collect()
}

/// Unfilled fields in canonical priority order, regardless of fill order.
pub fn missing_fields(profile: &CandidateProfile) -> Vec<Field> {
    Field::ALL
        .iter()
        .copied()
        .filter(|field| !is_filled(profile, *field))
        .collect()
}

pub fn is_complete(profile: &CandidateProfile) -> bool {
    Field::ALL.iter().all(|field| is_filled(profile, *field))
}

/// Fraction of required fields filled, in [0, 1].
pub fn completion_ratio(profile: &CandidateProfile) -> f32 {
    let filled = Field::ALL
        .iter()
        .filter(|field| is_filled(profile, **field))
        .count();
    filled as f32 / Field::ALL.len() as f32
}

/// Merge an extraction into a copy of `profile`.
pub fn merge(profile: &CandidateProfile, result: &ExtractionResult, turn: u32) -> CandidateProfile {
    merge_report(profile, result, turn).profile
}

/// Merge an extraction and report what happened to each proposal.
///
/// A proposal is applied when it passes its validator and either the field
/// is unset or the proposal's confidence is at least the recorded one.
/// Re-proposing the value already held is a no-op.
pub fn merge_report(
    profile: &CandidateProfile,
    result: &ExtractionResult,
    turn: u32,
) -> MergeReport {
    let mut merged = profile.clone();
    let mut updated = Vec::new();
    let mut rejected = Vec::new();
    let mut discarded = Vec::new();

    for (field, proposal) in result.iter() {
        if let Err(failure) = validate(*field, &proposal.value) {
            warn!(field = %field, reason = failure.reason, "Rejected extracted value");
            rejected.push(failure);
            continue;
        }

        match merged.get(*field) {
            Some(existing) if existing.value == proposal.value => continue,
            Some(existing) if proposal.confidence < existing.confidence => {
                debug!(
                    field = %field,
                    existing = existing.confidence,
                    proposed = proposal.confidence,
                    "Discarded lower-confidence value"
                );
                discarded.push(*field);
                continue;
            }
            _ => {}
        }

        merged.set(
            *field,
            ProfileEntry {
                value: proposal.value.clone(),
                confidence: proposal.confidence,
                updated_turn: turn,
            },
        );
        updated.push(*field);
    }

    MergeReport {
        profile: merged,
        updated,
        rejected,
        discarded,
    }
}
