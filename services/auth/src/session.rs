//! Session lifecycle: creation, resolution, destruction.
//!
//! Session ids are opaque and unguessable (32 CSPRNG bytes, hex). The
//! store persists only `{user_id, created_at, expires_at}`; resolution
//! re-fetches the user and re-derives role-linked data every time, so
//! role and permission edits are observed on the very next request.

use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, Utc};
use rand::RngCore;
use tracing::info;

use crate::error::AuthResult;
use crate::models::{Principal, SessionRecord};
use crate::repositories::{StudentLinkStore, UserStore};
use crate::store::SessionStore;

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "session_id";

/// Session id length in bytes before hex encoding (32 bytes = 256 bits).
const SESSION_ID_BYTES: usize = 32;

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Session lifetime in seconds (default: 24 hours)
    pub ttl_seconds: u64,
    /// Whether to set the Secure flag on session cookies (on in
    /// production, off for plain-HTTP development)
    pub secure_cookies: bool,
}

impl SessionConfig {
    /// Create a new SessionConfig from environment variables
    ///
    /// # Environment Variables
    /// - `SESSION_TTL_SECONDS`: Session lifetime in seconds (default: 86400)
    /// - `SESSION_SECURE_COOKIES`: "true" to mark cookies Secure (default: "false")
    pub fn from_env() -> Result<Self> {
        let ttl_seconds = std::env::var("SESSION_TTL_SECONDS")
            .unwrap_or_else(|_| "86400".to_string())
            .parse()
            .unwrap_or(86400);

        let secure_cookies = std::env::var("SESSION_SECURE_COOKIES")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Ok(SessionConfig {
            ttl_seconds,
            secure_cookies,
        })
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 86400,
            secure_cookies: false,
        }
    }
}

/// Manages the session lifecycle against an injected backing store.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    users: Arc<dyn UserStore>,
    students: Arc<dyn StudentLinkStore>,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn SessionStore>,
        users: Arc<dyn UserStore>,
        students: Arc<dyn StudentLinkStore>,
        config: SessionConfig,
    ) -> Self {
        Self {
            store,
            users,
            students,
            config,
        }
    }

    /// Bind a freshly authenticated principal to a new session and
    /// return the opaque session id.
    pub async fn create(&self, principal: &Principal) -> AuthResult<String> {
        let session_id = generate_session_id();
        let now = Utc::now();
        let record = SessionRecord {
            user_id: principal.user_id,
            created_at: now,
            expires_at: now + Duration::seconds(self.config.ttl_seconds as i64),
        };

        self.store.put(&session_id, &record).await?;
        info!("Created session for user {}", principal.user_id);
        Ok(session_id)
    }

    /// Resolve a presented session id to a fresh principal.
    ///
    /// Missing, expired, tampered and syntactically malformed ids all
    /// degrade to `Ok(None)` — unauthenticated, indistinguishable from
    /// "never logged in". Only store faults surface as errors.
    pub async fn resolve(&self, session_id: &str) -> AuthResult<Option<Principal>> {
        if !session_id_is_well_formed(session_id) {
            return Ok(None);
        }

        let Some(record) = self.store.get(session_id).await? else {
            return Ok(None);
        };

        // Re-fetch the user: the session must resolve to an existing
        // account, and the role must be current, not a login-time copy.
        let Some(user) = self.users.find_by_id(record.user_id).await? else {
            self.store.delete(session_id).await?;
            return Ok(None);
        };

        let principal = Principal::for_user(&user, self.students.as_ref()).await?;
        Ok(Some(principal))
    }

    /// Destroy a session. Idempotent: destroying a nonexistent or
    /// already-expired session is not an error.
    pub async fn destroy(&self, session_id: &str) -> AuthResult<()> {
        if !session_id_is_well_formed(session_id) {
            return Ok(());
        }
        self.store.delete(session_id).await
    }

    /// Seconds until a freshly created session expires.
    pub fn ttl_seconds(&self) -> u64 {
        self.config.ttl_seconds
    }

    /// Whether session cookies carry the Secure flag.
    pub fn secure_cookies(&self) -> bool {
        self.config.secure_cookies
    }

    /// Reachability of the backing store, for health reporting.
    pub async fn health_check(&self) -> AuthResult<bool> {
        self.store.health_check().await
    }
}

/// Generate an opaque session id (hex-encoded CSPRNG bytes).
fn generate_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// A well-formed session id is exactly the hex encoding this service
/// produces. Anything else skips the store lookup entirely.
pub(crate) fn session_id_is_well_formed(session_id: &str) -> bool {
    session_id.len() == SESSION_ID_BYTES * 2
        && session_id.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn session_ids_are_long_and_distinct() {
        let a = generate_session_id();
        let b = generate_session_id();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert!(session_id_is_well_formed(&a));
    }

    #[test]
    fn malformed_ids_are_detected() {
        assert!(!session_id_is_well_formed(""));
        assert!(!session_id_is_well_formed("short"));
        assert!(!session_id_is_well_formed(&"g".repeat(64)));
        assert!(!session_id_is_well_formed(&"a".repeat(63)));
        assert!(!session_id_is_well_formed(&"a".repeat(65)));
    }

    #[test]
    #[serial]
    fn session_config_from_env_defaults() {
        unsafe {
            std::env::remove_var("SESSION_TTL_SECONDS");
            std::env::remove_var("SESSION_SECURE_COOKIES");
        }
        let config = SessionConfig::from_env().unwrap();
        assert_eq!(config.ttl_seconds, 86400);
        assert!(!config.secure_cookies);
    }

    #[test]
    #[serial]
    fn session_config_from_env_custom_values() {
        unsafe {
            std::env::set_var("SESSION_TTL_SECONDS", "3600");
            std::env::set_var("SESSION_SECURE_COOKIES", "true");
        }
        let config = SessionConfig::from_env().unwrap();
        assert_eq!(config.ttl_seconds, 3600);
        assert!(config.secure_cookies);

        unsafe {
            std::env::remove_var("SESSION_TTL_SECONDS");
            std::env::remove_var("SESSION_SECURE_COOKIES");
        }
    }
}
