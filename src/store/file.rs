//! JSON-file `SessionStore`: one `candidate_<id>.json` per conversation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

use super::crypto::SealingKey;
use super::traits::{SessionRecord, SessionStore};
use crate::error::StoreError;
use crate::screening::state::ConversationState;

const FILE_PREFIX: &str = "candidate_";

pub struct FileSessionStore {
    dir: PathBuf,
    key: SealingKey,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>, key: SealingKey) -> Self {
        Self {
            dir: dir.into(),
            key,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{FILE_PREFIX}{id}.json"))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn save(&self, state: &ConversationState) -> Result<SessionRecord, StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let record = SessionRecord::seal(state, &self.key)?;
        let json = serde_json::to_vec_pretty(&record)?;

        // Write to a temp file, then rename into place.
        let path = self.path_for(state.id);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;

        info!(
            conversation_id = %state.id,
            candidate = %record.anonymized_profile.anonymous_id,
            phase = %state.phase,
            "Conversation saved"
        );
        Ok(record)
    }

    async fn load(&self, id: Uuid) -> Result<ConversationState, StoreError> {
        let path = self.path_for(id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound { id });
            }
            Err(e) => return Err(e.into()),
        };
        let record: SessionRecord = serde_json::from_slice(&bytes)?;
        let state = record.open(&self.key)?;
        debug!(conversation_id = %id, version = %record.data_version, "Conversation loaded");
        Ok(state)
    }

    async fn list(&self) -> Result<Vec<Uuid>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(id) = name
                .to_str()
                .and_then(|n| n.strip_prefix(FILE_PREFIX))
                .and_then(|n| n.strip_suffix(".json"))
                .and_then(|n| Uuid::parse_str(n).ok())
            else {
                continue;
            };
            ids.push(id);
        }
        ids.sort();
        Ok(ids)
    }
}
