//! Error types for TalentScout.

use std::time::Duration;

use uuid::Uuid;

use crate::screening::state::ConversationPhase;

/// Top-level error type for the screening assistant.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Conversation error: {0}")]
    Conversation(#[from] ConversationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Contract violations on a conversation.
///
/// These are surfaced to the caller and never shown to the candidate.
#[derive(Debug, thiserror::Error)]
pub enum ConversationError {
    #[error("Conversation {id} has ended and accepts no further turns")]
    Ended { id: Uuid },

    #[error("Conversation {id} cannot transition from {from} to {to}")]
    InvalidTransition {
        id: Uuid,
        from: ConversationPhase,
        to: ConversationPhase,
    },

    #[error("No conversation with id {id}")]
    UnknownSession { id: Uuid },
}

/// Session persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Session {id} not found")]
    NotFound { id: Uuid },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encryption error: {0}")]
    Crypto(String),
}

/// Result type alias for the screening assistant.
pub type Result<T> = std::result::Result<T, Error>;
