//! In-memory store implementations for tests and offline development.
//!
//! Same contracts as the Postgres stores, including case-insensitive
//! username matching and `UsernameTaken` on duplicates.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{StudentLinkStore, UserStore};
use crate::error::{AuthError, AuthResult};
use crate::models::{NewUser, StudentLink, UpdateUser, User};

/// HashMap-backed user store.
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<Mutex<HashMap<Uuid, User>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a user entirely. Lets tests exercise sessions whose user
    /// vanished between creation and resolution.
    pub async fn remove(&self, id: Uuid) {
        self.users.lock().await.remove(&id);
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        let users = self.users.lock().await;
        Ok(users
            .values()
            .find(|u| u.username.eq_ignore_ascii_case(username.trim()))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<User>> {
        Ok(self.users.lock().await.get(&id).cloned())
    }

    async fn create(&self, new_user: &NewUser, password_digest: &str) -> AuthResult<User> {
        let mut users = self.users.lock().await;
        let username = new_user.username.trim();

        if users
            .values()
            .any(|u| u.username.eq_ignore_ascii_case(username))
        {
            return Err(AuthError::UsernameTaken);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_digest: password_digest.to_string(),
            role: new_user.role,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: Uuid, patch: &UpdateUser) -> AuthResult<Option<User>> {
        let mut users = self.users.lock().await;

        if let Some(new_name) = &patch.username {
            let taken = users
                .values()
                .any(|u| u.id != id && u.username.eq_ignore_ascii_case(new_name.trim()));
            if taken {
                return Err(AuthError::UsernameTaken);
            }
        }

        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(new_name) = &patch.username {
            user.username = new_name.trim().to_string();
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn list(&self) -> AuthResult<Vec<User>> {
        let mut users: Vec<User> = self.users.lock().await.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }
}

/// HashMap-backed student-link store.
#[derive(Clone, Default)]
pub struct MemoryStudentLinkStore {
    links: Arc<Mutex<HashMap<Uuid, StudentLink>>>,
}

impl MemoryStudentLinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a student profile for a user.
    pub async fn insert(&self, link: StudentLink) {
        self.links.lock().await.insert(link.user_id, link);
    }
}

#[async_trait]
impl StudentLinkStore for MemoryStudentLinkStore {
    async fn find_by_user_id(&self, user_id: Uuid) -> AuthResult<Option<StudentLink>> {
        Ok(self.links.lock().await.get(&user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn new_user(username: &str, role: Role) -> NewUser {
        NewUser {
            username: username.to_string(),
            password: "irrelevant-here".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn create_then_find_by_username_is_case_insensitive() {
        let store = MemoryUserStore::new();
        store
            .create(&new_user("Alice", Role::Teacher), "digest")
            .await
            .unwrap();

        let found = store.find_by_username("alice").await.unwrap();
        assert_eq!(found.unwrap().username, "Alice");
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let store = MemoryUserStore::new();
        store
            .create(&new_user("alice", Role::Teacher), "digest")
            .await
            .unwrap();

        let err = store
            .create(&new_user("ALICE", Role::Student), "digest")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UsernameTaken));
    }

    #[tokio::test]
    async fn update_patches_role_and_username() {
        let store = MemoryUserStore::new();
        let user = store
            .create(&new_user("alice", Role::Teacher), "digest")
            .await
            .unwrap();

        let updated = store
            .update(
                user.id,
                &UpdateUser {
                    username: None,
                    role: Some(Role::Admin),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.role, Role::Admin);
        assert_eq!(updated.username, "alice");
    }

    #[tokio::test]
    async fn update_missing_user_returns_none() {
        let store = MemoryUserStore::new();
        let result = store
            .update(Uuid::new_v4(), &UpdateUser::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
