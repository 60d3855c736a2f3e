//! Postgres-backed student-link store.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::StudentLinkStore;
use crate::error::{AuthError, AuthResult};
use crate::models::StudentLink;

/// Student-link store over the `student_links` table:
/// `(id, user_id, first_name, last_name, grade_level)`.
#[derive(Clone)]
pub struct PgStudentLinkStore {
    pool: PgPool,
}

impl PgStudentLinkStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StudentLinkStore for PgStudentLinkStore {
    async fn find_by_user_id(&self, user_id: Uuid) -> AuthResult<Option<StudentLink>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, first_name, last_name, grade_level
            FROM student_links
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Internal(e.into()))?;

        Ok(row.map(|row| StudentLink {
            id: row.get("id"),
            user_id: row.get("user_id"),
            first_name: row.get("first_name"),
            last_name: row.get("last_name"),
            grade_level: row.get("grade_level"),
        }))
    }
}
