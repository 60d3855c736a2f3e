//! Postgres-backed user store.

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use super::UserStore;
use crate::error::{AuthError, AuthResult};
use crate::models::{NewUser, Role, UpdateUser, User};

/// User store over the `users` table:
/// `(id, username, password_digest, role, created_at, updated_at)`
/// with a unique index on `LOWER(username)`.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> AuthResult<User> {
    let role: String = row.get("role");
    let role: Role = role
        .parse()
        .map_err(|e: crate::models::UnknownRole| AuthError::Internal(e.into()))?;

    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        password_digest: row.get("password_digest"),
        role,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, password_digest, role, created_at, updated_at
            FROM users
            WHERE LOWER(username) = LOWER($1)
            "#,
        )
        .bind(username.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Internal(e.into()))?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, password_digest, role, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Internal(e.into()))?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn create(&self, new_user: &NewUser, password_digest: &str) -> AuthResult<User> {
        info!("Creating user: {}", new_user.username);

        let result = sqlx::query(
            r#"
            INSERT INTO users (id, username, password_digest, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            RETURNING id, username, password_digest, role, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_user.username.trim())
        .bind(password_digest)
        .bind(new_user.role.as_str())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => user_from_row(&row),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(AuthError::UsernameTaken)
            }
            Err(e) => Err(AuthError::Internal(e.into())),
        }
    }

    async fn update(&self, id: Uuid, patch: &UpdateUser) -> AuthResult<Option<User>> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                role = COALESCE($3, role),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, username, password_digest, role, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(patch.username.as_deref().map(str::trim))
        .bind(patch.role.map(|r| r.as_str()))
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(row) => row.as_ref().map(user_from_row).transpose(),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(AuthError::UsernameTaken)
            }
            Err(e) => Err(AuthError::Internal(e.into())),
        }
    }

    async fn list(&self) -> AuthResult<Vec<User>> {
        let rows = sqlx::query(
            r#"
            SELECT id, username, password_digest, role, created_at, updated_at
            FROM users
            ORDER BY username
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AuthError::Internal(e.into()))?;

        rows.iter().map(user_from_row).collect()
    }
}
