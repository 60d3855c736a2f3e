//! Per-username lockout against brute-force login attempts.
//!
//! Sits in front of the authenticator: a locked username fails fast
//! with `RateLimited` before any store lookup or hashing happens, so a
//! credential-stuffing loop cannot ride the deliberately slow password
//! derivation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::info;

use crate::error::{AuthError, AuthResult};

/// Throttle configuration
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    /// Failed attempts tolerated within the window before locking
    pub max_failures: u32,
    /// Width of the failure-counting window in seconds
    pub window_seconds: u64,
    /// How long a locked username stays locked, in seconds
    pub lockout_seconds: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_failures: 5,
            window_seconds: 300,  // 5 minutes
            lockout_seconds: 900, // 15 minutes
        }
    }
}

#[derive(Debug)]
struct ThrottleEntry {
    failures: u32,
    window_start: Instant,
    locked_until: Option<Instant>,
}

/// Failed-login throttle keyed by lowercased username.
#[derive(Debug, Clone)]
pub struct LoginThrottle {
    config: ThrottleConfig,
    entries: Arc<Mutex<HashMap<String, ThrottleEntry>>>,
}

impl LoginThrottle {
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn key(username: &str) -> String {
        username.trim().to_lowercase()
    }

    /// Gate a login attempt. Does not count anything; only the outcome
    /// calls ([`record_failure`](Self::record_failure) /
    /// [`record_success`](Self::record_success)) move the counters.
    pub async fn check(&self, username: &str) -> AuthResult<()> {
        let mut entries = self.entries.lock().await;
        let Some(entry) = entries.get_mut(&Self::key(username)) else {
            return Ok(());
        };

        if let Some(locked_until) = entry.locked_until {
            if Instant::now() < locked_until {
                return Err(AuthError::RateLimited);
            }
            // Lock elapsed; start clean.
            entries.remove(&Self::key(username));
        }

        Ok(())
    }

    /// Count a failed attempt; locks the username once the window fills.
    pub async fn record_failure(&self, username: &str) {
        let key = Self::key(username);
        let now = Instant::now();
        let window = Duration::from_secs(self.config.window_seconds);

        let mut entries = self.entries.lock().await;
        let entry = entries.entry(key.clone()).or_insert(ThrottleEntry {
            failures: 0,
            window_start: now,
            locked_until: None,
        });

        if now.duration_since(entry.window_start) >= window {
            entry.failures = 0;
            entry.window_start = now;
        }

        entry.failures += 1;
        if entry.failures >= self.config.max_failures {
            entry.locked_until = Some(now + Duration::from_secs(self.config.lockout_seconds));
            info!(
                "Locked username '{}' for {} seconds after {} failed login attempts",
                key, self.config.lockout_seconds, entry.failures
            );
        }
    }

    /// A successful login clears the username's slate.
    pub async fn record_success(&self, username: &str) {
        self.entries.lock().await.remove(&Self::key(username));
    }
}

impl Default for LoginThrottle {
    fn default() -> Self {
        Self::new(ThrottleConfig::default())
    }
}
