use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::store::{SessionHandle, SessionSlot, SessionStore};
use super::types::{Session, SessionSummary};

/// Thread-safe in-memory conversation cache.
///
/// Sessions are never evicted: they live until deleted or until the process
/// exits. Each session log is bounded by the retention policy, the number of
/// sessions is not.
#[derive(Clone, Default)]
pub struct ConversationCache {
    /// Session storage: session_id -> session state
    storage: Arc<DashMap<String, SessionHandle>>,
}

impl ConversationCache {
    pub fn new() -> Self {
        info!("Initializing conversation cache with DashMap");
        Self::default()
    }

    /// Number of active sessions
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Clone handles out of the map so no shard lock is held across `.await`
    fn handles(&self) -> Vec<SessionHandle> {
        self.storage
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}

#[async_trait]
impl SessionStore for ConversationCache {
    async fn get(&self, session_id: &str) -> Option<Session> {
        let handle = self.storage.get(session_id).map(|e| e.value().clone())?;
        Some(handle.snapshot())
    }

    async fn get_or_create(&self, session_id: &str) -> (SessionHandle, bool) {
        let mut created = false;
        let handle = self
            .storage
            .entry(session_id.to_string())
            .or_insert_with(|| {
                created = true;
                Arc::new(SessionSlot::new(Session::new(session_id)))
            })
            .value()
            .clone();

        if created {
            debug!("Created session {} in cache", session_id);
        }
        (handle, created)
    }

    async fn delete(&self, session_id: &str) -> bool {
        let removed = self.storage.remove(session_id).is_some();
        if removed {
            debug!("Removed session {} from cache", session_id);
        }
        removed
    }

    async fn list(&self) -> Vec<SessionSummary> {
        let mut summaries: Vec<SessionSummary> = self
            .handles()
            .iter()
            .map(|handle| handle.read(Session::summary))
            .collect();
        summaries.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        summaries
    }
}
