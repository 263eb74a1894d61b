//! Screening dialogue: field extraction, slot tracking, exit detection,
//! question generation, and the controller that drives them.

pub mod controller;
pub mod exit;
pub mod extractor;
pub mod profile;
pub mod prompts;
pub mod questions;
pub mod remote;
pub mod slots;
pub mod state;

pub use controller::{ConversationController, ProfileSnapshot, TurnEvent, TurnKind};
pub use exit::ExitDetector;
pub use extractor::{ExtractionResult, FieldExtractor};
pub use profile::{CandidateProfile, Field, FieldValue};
pub use questions::{ExperienceBracket, QuestionRequest, QuestionSet};
pub use state::{ConversationPhase, ConversationState};
