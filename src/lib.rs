//! TalentScout: dialogue state manager for technical-recruitment screening.

pub mod config;
pub mod error;
pub mod llm;
pub mod screening;
pub mod sessions;
pub mod store;
