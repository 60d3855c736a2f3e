//! Audit trail of authentication events.
//!
//! The log is fire-and-forget: a failed write is logged at warn and
//! never affects the login or logout that triggered it.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Login,
    Logout,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Login => "login",
            ActivityKind::Logout => "logout",
        }
    }
}

/// One audit record.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityEvent {
    pub kind: ActivityKind,
    pub user_id: Uuid,
    pub at: DateTime<Utc>,
}

impl ActivityEvent {
    pub fn login(user_id: Uuid) -> Self {
        Self {
            kind: ActivityKind::Login,
            user_id,
            at: Utc::now(),
        }
    }

    pub fn logout(user_id: Uuid) -> Self {
        Self {
            kind: ActivityKind::Logout,
            user_id,
            at: Utc::now(),
        }
    }
}

/// The activity-log collaborator.
#[async_trait]
pub trait ActivityLog: Send + Sync {
    async fn record(&self, event: ActivityEvent) -> anyhow::Result<()>;
}

/// Spawn the write so the caller never waits on the audit sink.
pub fn record_detached(log: Arc<dyn ActivityLog>, event: ActivityEvent) {
    tokio::spawn(async move {
        if let Err(e) = log.record(event).await {
            warn!("Failed to record activity event: {:#}", e);
        }
    });
}

/// Postgres-backed activity log over the `activity_log` table:
/// `(id, kind, user_id, occurred_at)`.
#[derive(Clone)]
pub struct PgActivityLog {
    pool: PgPool,
}

impl PgActivityLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityLog for PgActivityLog {
    async fn record(&self, event: ActivityEvent) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_log (id, kind, user_id, occurred_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(event.kind.as_str())
        .bind(event.user_id)
        .bind(event.at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Collects events in memory, for tests.
#[derive(Clone, Default)]
pub struct MemoryActivityLog {
    events: Arc<Mutex<Vec<ActivityEvent>>>,
}

impl MemoryActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<ActivityEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl ActivityLog for MemoryActivityLog {
    async fn record(&self, event: ActivityEvent) -> anyhow::Result<()> {
        self.events.lock().await.push(event);
        Ok(())
    }
}
