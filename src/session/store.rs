//! Session persistence capability and the in-process reference store.
//!
//! # Overview
//!
//! [`SessionStore`] is the narrow interface the session service needs from a
//! storage backend: keyed get / set-with-TTL / delete.  It is object-safe and
//! `Send + Sync` so a backend can be held behind an `Arc<dyn SessionStore>`.
//!
//! [`InMemoryStore`] keeps JSON-serialised sessions in a `HashMap` and
//! expires them lazily: a key on its own read, every key on any write.
//! Data is lost when the process exits and is not shared between processes;
//! production deployments plug in their own backend.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;

use crate::session::state::Session;

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

/// Failures of a storage backend.  "No such key" is `Ok(None)`, never an error.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The session could not be encoded or a stored value could not be decoded.
    #[error("session serialisation failed: {0}")]
    Serialization(String),

    /// The backend itself failed (connection, lock, I/O …).
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// SessionStore trait
// ---------------------------------------------------------------------------

/// Keyed session storage with optional time-to-live.
///
/// Reads and writes of one key must be observed in program order by a
/// single caller.  Serializing concurrent checks on the same session is the
/// caller's job (see [`SessionService`](super::SessionService)).
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch the session stored under `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Session>, StoreError>;

    /// Store `session` under `key`, replacing any previous value.  `ttl` of
    /// `None` means no expiry.
    async fn set(&self, key: &str, session: &Session, ttl: Option<Duration>) -> Result<(), StoreError>;

    /// Remove `key`; returns `true` if something was removed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;
}

// Compile-time assertion: Box<dyn SessionStore> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SessionStore>) {}
};

/// Storage key for the session with `id`.
pub fn session_key(id: &str) -> String {
    format!("session:{id}")
}

// ---------------------------------------------------------------------------
// InMemoryStore
// ---------------------------------------------------------------------------

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|t| now >= t)
    }
}

/// Process-local [`SessionStore`] for development and tests.
///
/// Values are stored as JSON so that what comes back out has gone through
/// the same serialisation a remote backend would apply.
#[derive(Default)]
pub struct InMemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` if `key` holds an unexpired value.
    pub fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let mut entries = self.lock()?;
        Ok(Self::live_entry(&mut entries, key).is_some())
    }

    /// Unexpired keys starting with `prefix`, sorted.
    pub fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut entries = self.lock()?;
        let now = Instant::now();
        entries.retain(|_, e| !e.is_expired(now));
        let mut keys: Vec<String> = entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Entry>>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".into()))
    }

    /// Return the entry for `key`, dropping it first if it has expired.
    fn live_entry<'a>(entries: &'a mut HashMap<String, Entry>, key: &str) -> Option<&'a Entry> {
        if entries.get(key).is_some_and(|e| e.is_expired(Instant::now())) {
            entries.remove(key);
            return None;
        }
        entries.get(key)
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Session>, StoreError> {
        let mut entries = self.lock()?;
        match Self::live_entry(&mut entries, key) {
            Some(entry) => Ok(Some(serde_json::from_str(&entry.value)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, session: &Session, ttl: Option<Duration>) -> Result<(), StoreError> {
        let value = serde_json::to_string(session)?;
        let now = Instant::now();
        let expires_at = ttl.map(|d| now + d);
        let mut entries = self.lock()?;
        entries.retain(|_, e| !e.is_expired(now));
        entries.insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.lock()?.remove(key).is_some())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
