//! The authenticated identity reconstructed per request.

use serde::Serialize;
use uuid::Uuid;

use super::role::Role;
use super::student::StudentLink;
use super::user::User;
use crate::error::AuthError;
use crate::repositories::StudentLinkStore;

/// The authenticated identity plus role, derived fresh from the user
/// store on every session resolution. Never persisted.
///
/// Serialization is for display-only response bodies; authorization
/// decisions always go through [`crate::guard::check_role`] or the
/// ownership helpers below, against a freshly built principal.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
    pub student: Option<StudentLink>,
}

impl Principal {
    /// Build the principal for a user, loading the linked student
    /// profile when the role calls for one.
    pub async fn for_user(
        user: &User,
        students: &dyn StudentLinkStore,
    ) -> Result<Self, AuthError> {
        let student = match user.role {
            Role::Student => students.find_by_user_id(user.id).await?,
            Role::Admin | Role::Teacher => None,
        };

        Ok(Principal {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
            student,
        })
    }

    /// Ownership check for user records: admins may touch any account,
    /// everyone else only their own.
    pub fn can_view_user(&self, target: Uuid) -> bool {
        self.role == Role::Admin || self.user_id == target
    }

    /// Ownership check for student-keyed resources (grades, attendance).
    /// Staff see everything; a student only their own linked record.
    pub fn owns_student(&self, student_id: Uuid) -> bool {
        match self.role {
            Role::Admin | Role::Teacher => true,
            Role::Student => self
                .student
                .as_ref()
                .is_some_and(|link| link.id == student_id),
        }
    }
}
