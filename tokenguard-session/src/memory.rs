//! In-memory session and session registry.
//!
//! Uses DashMap for thread-safe concurrent access. Suitable for single-instance
//! deployments or testing; hosts with their own session layer implement
//! [`CsrfSession`] on their session type instead.

use crate::error::{SessionError, SessionResult};
use crate::tokens::{PAGE_TOKENS_KEY, SessionTokens};
use crate::traits::{CsrfSession, generate_session_id};
use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// A session held in process memory.
#[derive(Debug, Default)]
pub struct MemorySession {
    id: String,
    tokens: Mutex<SessionTokens>,
    data: Mutex<HashMap<String, Value>>,
}

impl MemorySession {
    /// Create an empty session with the given ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Restore a session from untyped attributes.
    ///
    /// The master token is read from `master_key` and the page map from
    /// [`PAGE_TOKENS_KEY`]; every other attribute becomes host data.
    pub fn from_attributes(
        id: impl Into<String>,
        master_key: &str,
        mut attributes: HashMap<String, Value>,
    ) -> SessionResult<Self> {
        let tokens = SessionTokens::from_attributes(master_key, &attributes)?;
        attributes.remove(master_key);
        attributes.remove(PAGE_TOKENS_KEY);

        Ok(Self {
            id: id.into(),
            tokens: Mutex::new(tokens),
            data: Mutex::new(attributes),
        })
    }

    /// Export host data and token attributes as one attribute map.
    pub fn to_attributes(&self, master_key: &str) -> SessionResult<HashMap<String, Value>> {
        let mut attributes = self.data.lock().clone();
        attributes.extend(self.tokens.lock().to_attributes(master_key)?);
        Ok(attributes)
    }

    /// Get a host value from the session data.
    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.data
            .lock()
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Set a host value in the session data.
    pub fn set<T: Serialize>(&self, key: &str, value: T) -> SessionResult<()> {
        let json_value =
            serde_json::to_value(value).map_err(|e| SessionError::Serialization(e.to_string()))?;
        self.data.lock().insert(key.to_string(), json_value);
        Ok(())
    }
}

impl CsrfSession for MemorySession {
    fn id(&self) -> &str {
        &self.id
    }

    fn tokens(&self) -> MutexGuard<'_, SessionTokens> {
        self.tokens.lock()
    }
}

/// Registry of in-memory sessions keyed by session ID.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: DashMap<String, Arc<MemorySession>>,
}

impl MemorySessionStore {
    /// Create an empty registry.
    pub fn new() -> Self {
        debug!("Creating new in-memory session store");
        Self::default()
    }

    /// Create and register a new session.
    pub fn create(&self) -> Arc<MemorySession> {
        let session = Arc::new(MemorySession::new(generate_session_id()));
        trace!(session_id = %session.id(), "Session created");
        self.sessions
            .insert(session.id().to_string(), Arc::clone(&session));
        session
    }

    /// Register an existing session, replacing any session with the same ID.
    pub fn insert(&self, session: Arc<MemorySession>) {
        self.sessions.insert(session.id().to_string(), session);
    }

    /// Get a session by ID.
    pub fn get(&self, session_id: &str) -> Option<Arc<MemorySession>> {
        self.sessions.get(session_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Get a session by ID, failing if it is unknown.
    pub fn require(&self, session_id: &str) -> SessionResult<Arc<MemorySession>> {
        if session_id.is_empty() {
            return Err(SessionError::InvalidSessionId(session_id.to_string()));
        }
        self.get(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))
    }

    /// Remove a session.
    pub fn remove(&self, session_id: &str) -> Option<Arc<MemorySession>> {
        self.sessions.remove(session_id).map(|(_, session)| session)
    }

    /// Number of registered sessions.
    pub fn count(&self) -> usize {
        self.sessions.len()
    }
}
