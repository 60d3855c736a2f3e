//! Store abstractions and their implementations.
//!
//! The authenticator, session manager and guard depend only on these
//! traits, never on a concrete pool or map. Production wiring injects
//! the Postgres-backed implementations; tests and offline development
//! use the in-memory ones from [`memory`].

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AuthResult;
use crate::models::{NewUser, StudentLink, UpdateUser, User};

pub mod memory;
pub mod student;
pub mod user;

pub use memory::{MemoryStudentLinkStore, MemoryUserStore};
pub use student::PgStudentLinkStore;
pub use user::PgUserStore;

/// The user store collaborator. Usernames are matched
/// case-insensitively everywhere.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<User>>;

    /// Persist a new user with an already-derived password digest.
    /// Fails with `UsernameTaken` on a duplicate username.
    async fn create(&self, new_user: &NewUser, password_digest: &str) -> AuthResult<User>;

    /// Apply a partial update. Returns `None` when the user does not
    /// exist.
    async fn update(&self, id: Uuid, patch: &UpdateUser) -> AuthResult<Option<User>>;

    async fn list(&self) -> AuthResult<Vec<User>>;
}

/// The student-link store collaborator: resolves the student profile
/// joined to a Student-role user.
#[async_trait]
pub trait StudentLinkStore: Send + Sync {
    async fn find_by_user_id(&self, user_id: Uuid) -> AuthResult<Option<StudentLink>>;
}
