//! Backend-agnostic `SessionStore` trait and the persisted record shape.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::crypto::SealingKey;
use crate::error::StoreError;
use crate::screening::profile::AnonymizedProfile;
use crate::screening::state::{ConversationPhase, ConversationState};

/// Version tag written into every record.
pub const DATA_VERSION: &str = "1.0";

/// One saved conversation. Candidate details and the transcript only
/// appear inside `encrypted_state`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub saved_at: DateTime<Utc>,
    pub data_version: String,
    pub conversation_id: Uuid,
    pub phase: ConversationPhase,
    /// The full `ConversationState` as JSON, sealed with the store's key.
    pub encrypted_state: String,
    /// Masked copy of the profile for reviewers without PII access.
    pub anonymized_profile: AnonymizedProfile,
}

impl SessionRecord {
    pub fn seal(state: &ConversationState, key: &SealingKey) -> Result<Self, StoreError> {
        let json = serde_json::to_vec(state)?;
        Ok(Self {
            saved_at: Utc::now(),
            data_version: DATA_VERSION.to_string(),
            conversation_id: state.id,
            phase: state.phase,
            encrypted_state: key.seal(&json)?,
            anonymized_profile: state.profile.anonymized(state.id),
        })
    }

    /// Decrypt the saved conversation.
    pub fn open(&self, key: &SealingKey) -> Result<ConversationState, StoreError> {
        let json = key.open(&self.encrypted_state)?;
        Ok(serde_json::from_slice(&json)?)
    }
}

/// Load/save of serialized conversations.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist the conversation, replacing any earlier save.
    async fn save(&self, state: &ConversationState) -> Result<SessionRecord, StoreError>;

    /// Restore a saved conversation.
    async fn load(&self, id: Uuid) -> Result<ConversationState, StoreError>;

    /// Ids of every saved conversation.
    async fn list(&self) -> Result<Vec<Uuid>, StoreError>;
}
