//! Session backing stores.
//!
//! Generic key-value persistence with expiry, behind a trait so the
//! session lifecycle never touches a concrete backend. Redis carries
//! production sessions (expiry enforced server-side by `SET EX`); the
//! in-memory store backs tests and offline development, checking expiry
//! on read.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use common::cache::RedisPool;

use crate::error::{AuthError, AuthResult};
use crate::models::SessionRecord;

/// Key-value persistence for session records, keyed by the opaque
/// session id. Delete is idempotent for every implementation.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn put(&self, session_id: &str, record: &SessionRecord) -> AuthResult<()>;

    /// Returns `None` for missing and expired records alike.
    async fn get(&self, session_id: &str) -> AuthResult<Option<SessionRecord>>;

    async fn delete(&self, session_id: &str) -> AuthResult<()>;

    async fn health_check(&self) -> AuthResult<bool>;
}

fn session_key(session_id: &str) -> String {
    format!("session:{}", session_id)
}

/// Redis-backed session store.
#[derive(Clone)]
pub struct RedisSessionStore {
    pool: RedisPool,
}

impl RedisSessionStore {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn put(&self, session_id: &str, record: &SessionRecord) -> AuthResult<()> {
        let payload =
            serde_json::to_string(record).map_err(|e| AuthError::Internal(e.into()))?;

        // Redis expires the key on its own; the seconds until expiry are
        // derived from the record so the two never disagree.
        let ttl = (record.expires_at - Utc::now()).num_seconds().max(1) as u64;

        self.pool
            .set(&session_key(session_id), &payload, Some(ttl))
            .await
            .map_err(|e| AuthError::Internal(e.into()))
    }

    async fn get(&self, session_id: &str) -> AuthResult<Option<SessionRecord>> {
        let payload = self
            .pool
            .get(&session_key(session_id))
            .await
            .map_err(|e| AuthError::Internal(e.into()))?;

        match payload {
            Some(json) => {
                let record: SessionRecord =
                    serde_json::from_str(&json).map_err(|e| AuthError::Internal(e.into()))?;
                if record.is_expired() {
                    return Ok(None);
                }
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, session_id: &str) -> AuthResult<()> {
        self.pool
            .delete(&session_key(session_id))
            .await
            .map_err(|e| AuthError::Internal(e.into()))
    }

    async fn health_check(&self) -> AuthResult<bool> {
        self.pool
            .health_check()
            .await
            .map_err(|e| AuthError::Internal(e.into()))
    }
}

/// In-memory session store. Expired entries are dropped when read.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    entries: Arc<Mutex<HashMap<String, SessionRecord>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(&self, session_id: &str, record: &SessionRecord) -> AuthResult<()> {
        self.entries
            .lock()
            .await
            .insert(session_id.to_string(), record.clone());
        Ok(())
    }

    async fn get(&self, session_id: &str) -> AuthResult<Option<SessionRecord>> {
        let mut entries = self.entries.lock().await;
        match entries.get(session_id) {
            Some(record) if record.is_expired() => {
                entries.remove(session_id);
                Ok(None)
            }
            Some(record) => Ok(Some(record.clone())),
            None => Ok(None),
        }
    }

    async fn delete(&self, session_id: &str) -> AuthResult<()> {
        self.entries.lock().await.remove(session_id);
        Ok(())
    }

    async fn health_check(&self) -> AuthResult<bool> {
        Ok(true)
    }
}
