//! Authorization guard: authentication extraction plus role checks.
//!
//! Two layers, checked in order: a request must carry a resolvable
//! session (else 401), and the resulting principal's role must be in
//! the operation's allowed set (else 403). Ownership rules beyond role
//! live on [`Principal`] and are applied per handler.

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::AppState;
use crate::error::{AuthError, AuthResult};
use crate::models::{Principal, Role};
use crate::session::{SESSION_COOKIE, session_id_is_well_formed};

/// Roles allowed to manage user accounts.
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// Roles allowed to mutate course-class resources.
pub const STAFF: &[Role] = &[Role::Admin, Role::Teacher];

/// The central role predicate. Declarative and exhaustive: every
/// protected route names its allowed set and nothing else.
pub fn check_role(principal: &Principal, allowed: &[Role]) -> AuthResult<()> {
    if allowed.contains(&principal.role) {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

/// Resolve the session cookie on a request to a fresh principal.
async fn resolve_principal(state: &AppState, jar: &CookieJar) -> AuthResult<Principal> {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Err(AuthError::Unauthenticated);
    };

    let session_id = cookie.value();
    if !session_id_is_well_formed(session_id) {
        return Err(AuthError::MalformedSession);
    }

    state
        .sessions
        .resolve(session_id)
        .await?
        .ok_or(AuthError::Unauthenticated)
}

/// Handlers that take a [`Principal`] argument are
/// authentication-gated. Reuses a principal already resolved by a
/// route-layer guard instead of hitting the stores twice.
#[async_trait]
impl FromRequestParts<AppState> for Principal {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AuthError> {
        if let Some(principal) = parts.extensions.get::<Principal>() {
            return Ok(principal.clone());
        }

        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| AuthError::Unauthenticated)?;
        resolve_principal(state, &jar).await
    }
}

async fn authorize(
    state: AppState,
    jar: CookieJar,
    allowed: &[Role],
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let principal = resolve_principal(&state, &jar).await?;
    check_role(&principal, allowed)?;
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

/// Route-layer middleware for admin-only route groups.
pub async fn require_admin(
    State(state): State<AppState>,
    jar: CookieJar,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    authorize(state, jar, ADMIN_ONLY, req, next).await
}

/// Route-layer middleware for staff (admin or teacher) route groups.
pub async fn require_staff(
    State(state): State<AppState>,
    jar: CookieJar,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    authorize(state, jar, STAFF, req, next).await
}
