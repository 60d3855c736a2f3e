//! Server-side session record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What the session store persists against an opaque session id.
///
/// Deliberately minimal: no role, no profile snapshot. The principal is
/// re-derived from the user store on every resolution so role edits take
/// effect on the next request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn fresh_record_is_not_expired() {
        let record = SessionRecord {
            user_id: Uuid::new_v4(),
            created_at: Utc::now(),
            expires_at: Utc::now() + Duration::hours(24),
        };
        assert!(!record.is_expired());
    }

    #[test]
    fn past_expiry_is_expired() {
        let record = SessionRecord {
            user_id: Uuid::new_v4(),
            created_at: Utc::now() - Duration::hours(25),
            expires_at: Utc::now() - Duration::hours(1),
        };
        assert!(record.is_expired());
    }
}
