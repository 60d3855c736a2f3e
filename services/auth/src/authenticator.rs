//! Credential verification and user registration.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::activity::{ActivityEvent, ActivityLog, record_detached};
use crate::error::{AuthError, AuthResult};
use crate::models::{NewUser, Principal, User};
use crate::password;
use crate::repositories::{StudentLinkStore, UserStore};
use crate::throttle::LoginThrottle;
use crate::validation;

/// Validates credentials against the user store and produces
/// fully-populated principals. Stateless per call: one lookup, one
/// verification, no retries.
#[derive(Clone)]
pub struct Authenticator {
    users: Arc<dyn UserStore>,
    students: Arc<dyn StudentLinkStore>,
    activity: Arc<dyn ActivityLog>,
    throttle: LoginThrottle,
}

impl Authenticator {
    pub fn new(
        users: Arc<dyn UserStore>,
        students: Arc<dyn StudentLinkStore>,
        activity: Arc<dyn ActivityLog>,
        throttle: LoginThrottle,
    ) -> Self {
        Self {
            users,
            students,
            activity,
            throttle,
        }
    }

    /// Verify a username/password pair and return the principal.
    ///
    /// "No such user" and "wrong password" fail with the same
    /// `InvalidCredentials` variant, and the unknown-user path burns a
    /// dummy derivation of identical cost, so neither the response nor
    /// its timing reveals whether the username exists.
    pub async fn login(&self, username: &str, password: &str) -> AuthResult<Principal> {
        info!("Login attempt for user: {}", username);
        self.throttle.check(username).await?;

        let Some(user) = self.users.find_by_username(username).await? else {
            let password = password.to_owned();
            spawn_hashing(move || {
                password::dummy_verify(&password);
                Ok(())
            })
            .await?;
            self.throttle.record_failure(username).await;
            return Err(AuthError::InvalidCredentials);
        };

        let attempt = password.to_owned();
        let digest = user.password_digest.clone();
        let matches = spawn_hashing(move || Ok(password::verify(&attempt, &digest))).await?;

        if !matches {
            self.throttle.record_failure(username).await;
            return Err(AuthError::InvalidCredentials);
        }

        let principal = Principal::for_user(&user, self.students.as_ref()).await?;
        self.throttle.record_success(username).await;
        record_detached(self.activity.clone(), ActivityEvent::login(user.id));

        Ok(principal)
    }

    /// Register a new user: validate the payload shape, digest the
    /// password, hand the record to the user store.
    pub async fn register(&self, new_user: NewUser) -> AuthResult<User> {
        validation::validate_username(&new_user.username).map_err(AuthError::Validation)?;
        validation::validate_password(&new_user.password).map_err(AuthError::Validation)?;

        let plaintext = new_user.password.clone();
        let digest = spawn_hashing(move || password::hash(&plaintext)).await?;

        self.users.create(&new_user, &digest).await
    }
}

/// Run a password derivation on the blocking pool so concurrent logins
/// cannot starve the async workers; the cost of the hash is its point.
async fn spawn_hashing<T, F>(f: F) -> AuthResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(f)
        .await
        .context("password hashing task failed")?;
    result.map_err(AuthError::Internal)
}
