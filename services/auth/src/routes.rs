//! Authentication service routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::AppState;
use crate::activity::{ActivityEvent, record_detached};
use crate::error::AuthError;
use crate::guard;
use crate::models::{NewUser, Principal, Role, UpdateUser, User};
use crate::session::SESSION_COOKIE;

/// Request for user login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response for user login. The embedded principal is display-only;
/// authorization always re-derives it from the session on later
/// requests.
#[derive(Serialize)]
pub struct LoginResponse {
    pub principal: Principal,
    pub expires_in: u64,
}

/// User payload for responses. Never carries the password digest.
#[derive(Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/users", post(create_user).get(list_users))
        .route("/users/:id", patch(update_user))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::require_admin,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
        .route("/users/:id", get(get_user))
        .merge(admin_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = common::database::health_check(&state.db_pool)
        .await
        .unwrap_or(false);
    let session_store = state.sessions.health_check().await.unwrap_or(false);

    let status = if database && session_store {
        "ok"
    } else {
        "degraded"
    };

    Json(json!({
        "status": status,
        "service": "auth-service",
        "database": database,
        "session_store": session_store,
    }))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let principal = state
        .authenticator
        .login(&payload.username, &payload.password)
        .await?;

    let session_id = state.sessions.create(&principal).await?;
    let jar = jar.add(session_cookie(&state, session_id));

    Ok((
        jar,
        Json(LoginResponse {
            principal,
            expires_in: state.sessions.ttl_seconds(),
        }),
    ))
}

/// Logout endpoint. Idempotent: succeeds with or without a live session.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AuthError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let session_id = cookie.value().to_owned();

        // Audit who is leaving while the session still resolves.
        if let Some(principal) = state.sessions.resolve(&session_id).await? {
            record_detached(
                state.activity.clone(),
                ActivityEvent::logout(principal.user_id),
            );
        }

        state.sessions.destroy(&session_id).await?;
    }

    let jar = jar.remove(removal_cookie());
    Ok((jar, Json(json!({ "message": "Logged out" }))))
}

/// Return the fresh principal for the presented session.
pub async fn me(principal: Principal) -> impl IntoResponse {
    Json(principal)
}

/// Fetch a single user. Admins may fetch anyone; everyone else only
/// themselves.
pub async fn get_user(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AuthError> {
    if !principal.can_view_user(id) {
        return Err(AuthError::Forbidden);
    }

    let user = state.users.find_by_id(id).await?.ok_or(AuthError::NotFound)?;
    Ok(Json(UserResponse::from(user)))
}

/// Register a new user (admin only, via route layer).
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<NewUser>,
) -> Result<impl IntoResponse, AuthError> {
    let user = state.authenticator.register(payload).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// List all users (admin only, via route layer).
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, AuthError> {
    let users = state.users.list().await?;
    let users: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(Json(users))
}

/// Patch a user's username or role (admin only, via route layer).
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdateUser>,
) -> Result<impl IntoResponse, AuthError> {
    let user = state
        .users
        .update(id, &patch)
        .await?
        .ok_or(AuthError::NotFound)?;
    Ok(Json(UserResponse::from(user)))
}

fn session_cookie(state: &AppState, session_id: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(state.sessions.secure_cookies())
        .build()
}

fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .build()
}
