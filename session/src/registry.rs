//! Registry of live sessions.
//!
//! Objects handed out by a session (such as [`LazyBinary`](crate::LazyBinary))
//! only keep the session's key. They find the session's workspace and
//! transport through the registry, and stop working once it logs out.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cairn_transport::{LoginId, Transport};

/// Opaque key of a registered session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey(u64);

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// What other components may use of a live session.
#[derive(Clone)]
pub struct SessionContext {
    pub key: SessionKey,
    pub workspace: String,
    pub user_id: Option<String>,
    pub login: LoginId,
    pub transport: Arc<dyn Transport>,
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("key", &self.key)
            .field("workspace", &self.workspace)
            .field("user_id", &self.user_id)
            .field("login", &self.login)
            .finish_non_exhaustive()
    }
}

/// Key -> context map of the live sessions of one repository.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<SessionKey, SessionContext>>,
    next_key: AtomicU64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<SessionKey, SessionContext>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a session and allocate its key.
    pub fn register(
        &self,
        workspace: impl Into<String>,
        user_id: Option<String>,
        login: LoginId,
        transport: Arc<dyn Transport>,
    ) -> SessionKey {
        let key = SessionKey(self.next_key.fetch_add(1, Ordering::Relaxed) + 1);
        let context = SessionContext {
            key,
            workspace: workspace.into(),
            user_id,
            login,
            transport,
        };
        self.sessions().insert(key, context);
        key
    }

    /// Remove a session; returns its context if it was registered.
    pub fn unregister(&self, key: SessionKey) -> Option<SessionContext> {
        self.sessions().remove(&key)
    }

    pub fn lookup(&self, key: SessionKey) -> Option<SessionContext> {
        self.sessions().get(&key).cloned()
    }

    pub fn contains(&self, key: SessionKey) -> bool {
        self.sessions().contains_key(&key)
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions().is_empty()
    }
}
