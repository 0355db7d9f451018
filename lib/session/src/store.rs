//! Session storage backends.

use crate::error::SessionError;
use crate::session::SessionId;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use token_bridge_core::Result;
use tracing::debug;

/// Read-modify-write step for [`SessionStore::update`].
///
/// Receives the current value of the key. Returning `Some` stores the new
/// value; `None` leaves the session untouched.
pub type SessionUpdate<'a> =
    Box<dyn FnOnce(Option<&str>) -> Result<Option<String>, SessionError> + Send + 'a>;

/// Key/value storage scoped to a browser session.
///
/// Values are opaque strings; callers own their encoding. Implementations
/// serialize concurrent access themselves, including the read-modify-write
/// in [`SessionStore::update`].
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Reads a value, or `None` if the session or key does not exist.
    async fn get(&self, session: &SessionId, key: &str) -> Result<Option<String>, SessionError>;

    /// Writes a value, creating the session if needed. Every write restarts
    /// the session's TTL.
    async fn put(&self, session: &SessionId, key: &str, value: String)
    -> Result<(), SessionError>;

    /// Applies `apply` to the current value of `key` atomically with respect
    /// to other writers of the same store.
    async fn update(
        &self,
        session: &SessionId,
        key: &str,
        apply: SessionUpdate<'_>,
    ) -> Result<(), SessionError>;

    /// Whether the session was issued and has not expired.
    async fn exists(&self, session: &SessionId) -> Result<bool, SessionError>;

    /// Drops expired sessions, returning how many were removed.
    async fn delete_expired(&self) -> Result<usize, SessionError>;
}

#[derive(Debug)]
struct SessionEntry {
    values: HashMap<String, String>,
    expires_at: DateTime<Utc>,
}

impl SessionEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Process-local session store.
///
/// A session lives for a fixed TTL from its latest write. Expired sessions
/// are invisible to reads and are dropped by [`SessionStore::delete_expired`].
#[derive(Debug, Clone)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, SessionEntry>>>,
    ttl: Duration,
}

impl MemorySessionStore {
    /// Creates an empty store whose sessions live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    fn write(
        &self,
        sessions: &mut HashMap<SessionId, SessionEntry>,
        session: &SessionId,
        key: &str,
        value: String,
        now: DateTime<Utc>,
    ) {
        let entry = sessions
            .entry(session.clone())
            .or_insert_with(|| SessionEntry {
                values: HashMap::new(),
                expires_at: now,
            });

        // An expired session is replaced rather than revived.
        if entry.is_expired(now) {
            entry.values.clear();
        }

        entry.expires_at = now + self.ttl;
        entry.values.insert(key.to_string(), value);
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, session: &SessionId, key: &str) -> Result<Option<String>, SessionError> {
        let sessions = self.sessions.read().await;
        let value = sessions
            .get(session)
            .filter(|entry| !entry.is_expired(Utc::now()))
            .and_then(|entry| entry.values.get(key).cloned());
        Ok(value)
    }

    async fn put(
        &self,
        session: &SessionId,
        key: &str,
        value: String,
    ) -> Result<(), SessionError> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        self.write(&mut sessions, session, key, value, now);
        Ok(())
    }

    async fn update(
        &self,
        session: &SessionId,
        key: &str,
        apply: SessionUpdate<'_>,
    ) -> Result<(), SessionError> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;

        let current = sessions
            .get(session)
            .filter(|entry| !entry.is_expired(now))
            .and_then(|entry| entry.values.get(key))
            .map(String::as_str);
        if let Some(value) = apply(current)? {
            self.write(&mut sessions, session, key, value, now);
        }
        Ok(())
    }

    async fn exists(&self, session: &SessionId) -> Result<bool, SessionError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(session)
            .is_some_and(|entry| !entry.is_expired(Utc::now())))
    }

    async fn delete_expired(&self) -> Result<usize, SessionError> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| !entry.is_expired(now));
        let removed = before - sessions.len();

        debug!(removed, remaining = sessions.len(), "swept expired sessions");
        Ok(removed)
    }
}
