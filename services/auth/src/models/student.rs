//! Student profile linked to a Student-role user.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The student record joined to a user account when the account's role
/// is [`super::Role::Student`]. Resource handlers key ownership checks
/// on `id` (the student id), not the user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentLink {
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub grade_level: i16,
}
