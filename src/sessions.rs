//! Registry of live conversations.
//!
//! Conversations are independent: each owns its state behind its own lock, so
//! different candidates proceed in parallel while turns within one
//! conversation are strictly sequential.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ConversationError, Error};
use crate::screening::controller::{ConversationController, ProfileSnapshot, TurnEvent};
use crate::screening::state::ConversationState;
use crate::store::SessionStore;

/// One live conversation.
struct Session {
    state: Mutex<ConversationState>,
    /// Set by `end` so an in-flight turn discards late model results.
    aborted: AtomicBool,
}

impl Session {
    fn new(state: ConversationState) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(state),
            aborted: AtomicBool::new(false),
        })
    }
}

/// Ended conversations stay readable (state, snapshot) until they are
/// dropped with `remove` or `prune_ended`; long-running hosts should prune
/// periodically.
pub struct SessionRegistry {
    controller: Arc<ConversationController>,
    sessions: RwLock<HashMap<Uuid, Arc<Session>>>,
    store: Option<Arc<dyn SessionStore>>,
}

impl SessionRegistry {
    pub fn new(controller: Arc<ConversationController>) -> Self {
        Self {
            controller,
            sessions: RwLock::new(HashMap::new()),
            store: None,
        }
    }

    /// Save conversations to `store` when they end.
    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Start a new conversation and return its id.
    pub async fn open(&self) -> Uuid {
        self.insert(ConversationState::default()).await
    }

    /// Restore a saved conversation into the registry.
    pub async fn resume(&self, id: Uuid) -> Result<Uuid, Error> {
        let store = self
            .store
            .as_ref()
            .ok_or(ConversationError::UnknownSession { id })?;
        let state = store.load(id).await?;
        state.ensure_open()?;
        Ok(self.insert(state).await)
    }

    async fn insert(&self, state: ConversationState) -> Uuid {
        let id = state.id;
        self.sessions.write().await.insert(id, Session::new(state));
        info!(conversation_id = %id, "Conversation opened");
        id
    }

    async fn get(&self, id: Uuid) -> Result<Arc<Session>, ConversationError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(ConversationError::UnknownSession { id })
    }

    /// Feed one utterance to a conversation. Waits for any turn already in
    /// progress on the same conversation.
    pub async fn submit(&self, id: Uuid, utterance: &str) -> Result<TurnEvent, ConversationError> {
        let session = self.get(id).await?;
        let mut state = session.state.lock().await;
        let event = self
            .controller
            .handle_turn_cancellable(&mut state, utterance, &session.aborted)
            .await?;
        if state.terminated {
            self.persist(&state).await;
        }
        Ok(event)
    }

    /// End a conversation from outside the dialogue (window closed, timeout).
    ///
    /// A turn waiting on the model has its result discarded; the closing
    /// summary is emitted once the lock is free.
    pub async fn end(&self, id: Uuid) -> Result<TurnEvent, ConversationError> {
        let session = self.get(id).await?;
        session.aborted.store(true, Ordering::SeqCst);
        let mut state = session.state.lock().await;
        let event = self.controller.close(&mut state)?;
        self.persist(&state).await;
        Ok(event)
    }

    /// End every conversation that is still open, e.g. on shutdown.
    pub async fn end_all(&self) -> Vec<TurnEvent> {
        let sessions: Vec<(Uuid, Arc<Session>)> = self
            .sessions
            .read()
            .await
            .iter()
            .map(|(id, session)| (*id, Arc::clone(session)))
            .collect();

        let closes = sessions.into_iter().map(|(id, session)| async move {
            session.aborted.store(true, Ordering::SeqCst);
            let mut state = session.state.lock().await;
            if state.terminated {
                return None;
            }
            match self.controller.close(&mut state) {
                Ok(event) => {
                    self.persist(&state).await;
                    Some(event)
                }
                Err(e) => {
                    warn!(conversation_id = %id, error = %e, "Failed to close conversation");
                    None
                }
            }
        });
        futures::future::join_all(closes)
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    /// Collected-information view for the presentation layer.
    pub async fn snapshot(&self, id: Uuid) -> Result<ProfileSnapshot, ConversationError> {
        let session = self.get(id).await?;
        let state = session.state.lock().await;
        Ok(ProfileSnapshot::of(&state))
    }

    /// A copy of the conversation's full state.
    pub async fn state(&self, id: Uuid) -> Result<ConversationState, ConversationError> {
        let session = self.get(id).await?;
        let state = session.state.lock().await;
        Ok(state.clone())
    }

    /// Drop a conversation from the registry, returning its final state.
    pub async fn remove(&self, id: Uuid) -> Option<ConversationState> {
        let session = self.sessions.write().await.remove(&id)?;
        let state = session.state.lock().await;
        Some(state.clone())
    }

    /// Drop every ended conversation from memory, returning how many were
    /// dropped. Saved copies stay in the store. Conversations busy with a turn
    /// are kept.
    pub async fn prune_ended(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| {
            session
                .state
                .try_lock()
                .map(|state| !state.terminated)
                .unwrap_or(true)
        });
        let pruned = before - sessions.len();
        if pruned > 0 {
            info!(pruned, remaining = sessions.len(), "Ended conversations pruned");
        }
        pruned
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    async fn persist(&self, state: &ConversationState) {
        if let Some(store) = &self.store
            && let Err(e) = store.save(state).await
        {
            warn!(conversation_id = %state.id, error = %e, "Failed to save conversation");
        }
    }
}
