//! Authentication core of the campus administration backend.
//!
//! Verifies credentials, binds principals to server-side sessions, and
//! gates protected operations on a closed role set. The CRUD services
//! around it (students, courses, grades, attendance, assignments)
//! consume `login`, `logout`, session resolution and the role guard;
//! everything else here is plumbing for those four operations.

use std::sync::Arc;

use sqlx::PgPool;

pub mod activity;
pub mod authenticator;
pub mod error;
pub mod guard;
pub mod models;
pub mod password;
pub mod repositories;
pub mod routes;
pub mod session;
pub mod store;
pub mod throttle;
pub mod validation;

use activity::ActivityLog;
use authenticator::Authenticator;
use repositories::UserStore;
use session::SessionManager;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub sessions: SessionManager,
    pub authenticator: Authenticator,
    pub users: Arc<dyn UserStore>,
    pub activity: Arc<dyn ActivityLog>,
}
