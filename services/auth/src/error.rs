//! Error taxonomy for authentication and authorization failures.
//!
//! Every failure in this enum is recovered at the HTTP boundary and
//! converted to a status with a role-agnostic message. Only `Internal`
//! reaches the log at error level; its cause is never serialized to the
//! client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Authentication and authorization errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong username or password. One variant for both so the response
    /// never reveals whether the username existed.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// No valid session presented.
    #[error("authentication required")]
    Unauthenticated,

    /// Session token that does not even parse. Treated exactly like
    /// `Unauthenticated` at the boundary.
    #[error("authentication required")]
    MalformedSession,

    /// Valid session, insufficient role or ownership.
    #[error("insufficient permissions")]
    Forbidden,

    /// Registration with a username that already exists.
    #[error("username is already taken")]
    UsernameTaken,

    /// Registration payload failed shape validation.
    #[error("{0}")]
    Validation(String),

    /// Too many failed login attempts for this username.
    #[error("too many failed login attempts")]
    RateLimited,

    /// Requested record does not exist.
    #[error("not found")]
    NotFound,

    /// Unexpected internal fault (store unreachable, task join failure).
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid username or password")
            }
            // Expired, missing and malformed sessions are indistinguishable
            // from "never logged in".
            AuthError::Unauthenticated | AuthError::MalformedSession => {
                (StatusCode::UNAUTHORIZED, "Authentication required")
            }
            AuthError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden"),
            AuthError::UsernameTaken => (StatusCode::CONFLICT, "Username is already taken"),
            AuthError::Validation(ref msg) => {
                return (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({ "error": msg })),
                )
                    .into_response();
            }
            AuthError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many failed login attempts",
            ),
            AuthError::NotFound => (StatusCode::NOT_FOUND, "Not found"),
            AuthError::Internal(ref cause) => {
                error!("Internal auth service error: {:#}", cause);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Type alias for auth service results
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AuthError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn failure_classes_map_to_contracted_statuses() {
        assert_eq!(
            status_of(AuthError::InvalidCredentials),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AuthError::Unauthenticated),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AuthError::MalformedSession),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status_of(AuthError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(status_of(AuthError::UsernameTaken), StatusCode::CONFLICT);
        assert_eq!(
            status_of(AuthError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(status_of(AuthError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(AuthError::Internal(anyhow::anyhow!("boom"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn malformed_session_is_indistinguishable_from_unauthenticated() {
        // Same status; the body is the same constant for both arms.
        assert_eq!(
            status_of(AuthError::MalformedSession),
            status_of(AuthError::Unauthenticated)
        );
    }
}
