//! Data model for the auth service.

pub mod principal;
pub mod role;
pub mod session;
pub mod student;
pub mod user;

// Re-export for convenience
pub use principal::Principal;
pub use role::{Role, UnknownRole};
pub use session::SessionRecord;
pub use student::StudentLink;
pub use user::{NewUser, UpdateUser, User};
