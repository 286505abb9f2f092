//! Session persistence layer
//!
//! Stores one `ConversationState` per session id, spanning turns and
//! surviving suspensions. In-memory by default; a Postgres backend is
//! available for durable checkpoints. Per-session turn locks keep
//! read-modify-write atomic per session: concurrent turns on the same
//! session serialize, different sessions never contend.

use crate::models::ConversationState;
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

pub mod postgres;
pub use postgres::PostgresSessionStore;

/// Trait for session persistence
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, session_id: &str) -> Result<Option<ConversationState>>;
    async fn save(&self, session_id: &str, state: &ConversationState) -> Result<()>;

    /// True iff the session's last suspension has not been resumed yet.
    async fn has_pending_interrupt(&self, session_id: &str) -> Result<bool> {
        Ok(self
            .load(session_id)
            .await?
            .map(|state| state.has_pending_interrupt())
            .unwrap_or(false))
    }
}

/// In-memory session store for development
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, ConversationState>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<ConversationState>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_id).cloned())
    }

    async fn save(&self, session_id: &str, state: &ConversationState) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session_id.to_string(), state.clone());
        Ok(())
    }
}

/// Per-session turn locks. The design assumes at most one in-flight turn per
/// session; this serializes a racing caller instead of corrupting state.
#[derive(Clone)]
pub struct SessionLocks {
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self {
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn lock_for(&self, session_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Default for SessionLocks {
    fn default() -> Self {
        Self::new()
    }
}
