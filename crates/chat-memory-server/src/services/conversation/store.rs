use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use super::types::{Session, SessionSummary};

/// One stored session behind two locks.
///
/// `turn` serializes chat turns and may be held across the completion call.
/// `data` guards the session state and is only held for short synchronous
/// sections, so readers never wait on an in-flight completion.
pub struct SessionSlot {
    turn: Mutex<()>,
    data: RwLock<Session>,
}

impl SessionSlot {
    pub fn new(session: Session) -> Self {
        Self {
            turn: Mutex::new(()),
            data: RwLock::new(session),
        }
    }

    /// Waits until no other turn runs on this session
    pub async fn begin_turn(&self) -> MutexGuard<'_, ()> {
        self.turn.lock().await
    }

    pub fn read<R>(&self, f: impl FnOnce(&Session) -> R) -> R {
        f(&self.data.read())
    }

    pub fn write<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        f(&mut self.data.write())
    }

    pub fn snapshot(&self) -> Session {
        self.data.read().clone()
    }
}

pub type SessionHandle = Arc<SessionSlot>;

/// Storage seam for conversation sessions.
///
/// The controller only talks to this trait, so the in-memory cache can be
/// replaced by a persistent or shared backend.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Snapshot of a session, if it exists
    async fn get(&self, session_id: &str) -> Option<Session>;

    /// Existing session handle, or a freshly created empty session.
    /// The flag is `true` when the session was created by this call.
    async fn get_or_create(&self, session_id: &str) -> (SessionHandle, bool);

    /// Returns `true` if a session existed and was removed
    async fn delete(&self, session_id: &str) -> bool;

    async fn list(&self) -> Vec<SessionSummary>;
}
