//! End-to-end authentication flows against the in-memory stores.

use std::mem::discriminant;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use uuid::Uuid;

use auth::activity::{ActivityKind, MemoryActivityLog};
use auth::authenticator::Authenticator;
use auth::error::AuthError;
use auth::models::{NewUser, Role, SessionRecord, StudentLink, UpdateUser, User};
use auth::repositories::{MemoryStudentLinkStore, MemoryUserStore, UserStore};
use auth::session::{SessionConfig, SessionManager};
use auth::store::{MemorySessionStore, SessionStore};
use auth::throttle::{LoginThrottle, ThrottleConfig};

struct TestEnv {
    users: MemoryUserStore,
    students: MemoryStudentLinkStore,
    activity: MemoryActivityLog,
    store: MemorySessionStore,
    authenticator: Authenticator,
    sessions: SessionManager,
}

fn test_env() -> TestEnv {
    let users = MemoryUserStore::new();
    let students = MemoryStudentLinkStore::new();
    let activity = MemoryActivityLog::new();
    let store = MemorySessionStore::new();

    let authenticator = Authenticator::new(
        Arc::new(users.clone()),
        Arc::new(students.clone()),
        Arc::new(activity.clone()),
        LoginThrottle::new(ThrottleConfig {
            max_failures: 3,
            window_seconds: 300,
            lockout_seconds: 900,
        }),
    );

    let sessions = SessionManager::new(
        Arc::new(store.clone()),
        Arc::new(users.clone()),
        Arc::new(students.clone()),
        SessionConfig::default(),
    );

    TestEnv {
        users,
        students,
        activity,
        store,
        authenticator,
        sessions,
    }
}

async fn seed_user(env: &TestEnv, username: &str, password: &str, role: Role) -> User {
    env.authenticator
        .register(NewUser {
            username: username.to_string(),
            password: password.to_string(),
            role,
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn login_with_correct_password_returns_stored_role() {
    let env = test_env();
    let alice = seed_user(&env, "alice", "correct-pw", Role::Teacher).await;

    let principal = env.authenticator.login("alice", "correct-pw").await.unwrap();
    assert_eq!(principal.user_id, alice.id);
    assert_eq!(principal.username, "alice");
    assert_eq!(principal.role, Role::Teacher);
    assert!(principal.student.is_none());
}

#[tokio::test]
async fn wrong_password_and_unknown_user_fail_with_the_same_error_class() {
    let env = test_env();
    seed_user(&env, "alice", "correct-pw", Role::Teacher).await;

    let wrong_pw = env.authenticator.login("alice", "wrong-pw").await.unwrap_err();
    let no_user = env
        .authenticator
        .login("nobody", "anything")
        .await
        .unwrap_err();

    assert!(matches!(wrong_pw, AuthError::InvalidCredentials));
    assert_eq!(discriminant(&wrong_pw), discriminant(&no_user));
}

#[tokio::test]
async fn successful_login_records_an_audit_event() {
    let env = test_env();
    let alice = seed_user(&env, "alice", "correct-pw", Role::Admin).await;

    env.authenticator.login("alice", "correct-pw").await.unwrap();

    // The audit write is fire-and-forget; give the spawned task a beat.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let events = env.activity.events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, ActivityKind::Login);
    assert_eq!(events[0].user_id, alice.id);
}

#[tokio::test]
async fn student_login_carries_the_linked_profile() {
    let env = test_env();
    let user = seed_user(&env, "ada_l", "students-pw", Role::Student).await;

    let link = StudentLink {
        id: Uuid::new_v4(),
        user_id: user.id,
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        grade_level: 7,
    };
    env.students.insert(link.clone()).await;

    let principal = env.authenticator.login("ada_l", "students-pw").await.unwrap();
    let loaded = principal.student.expect("student link missing");
    assert_eq!(loaded.id, link.id);
    assert_eq!(loaded.last_name, "Lovelace");
}

#[tokio::test]
async fn session_roundtrip_resolves_to_the_same_user() {
    let env = test_env();
    seed_user(&env, "bob", "teachers-pw", Role::Teacher).await;
    let principal = env.authenticator.login("bob", "teachers-pw").await.unwrap();

    let session_id = env.sessions.create(&principal).await.unwrap();
    let resolved = env
        .sessions
        .resolve(&session_id)
        .await
        .unwrap()
        .expect("session did not resolve");

    assert_eq!(resolved.user_id, principal.user_id);
    assert_eq!(resolved.role, Role::Teacher);
}

#[tokio::test]
async fn role_change_is_observed_on_the_next_resolution() {
    let env = test_env();
    let user = seed_user(&env, "carol", "correct-pw", Role::Teacher).await;
    let principal = env.authenticator.login("carol", "correct-pw").await.unwrap();
    let session_id = env.sessions.create(&principal).await.unwrap();

    env.users
        .update(
            user.id,
            &UpdateUser {
                username: None,
                role: Some(Role::Admin),
            },
        )
        .await
        .unwrap();

    let resolved = env.sessions.resolve(&session_id).await.unwrap().unwrap();
    assert_eq!(resolved.role, Role::Admin);
}

#[tokio::test]
async fn destroyed_session_never_resolves_again() {
    let env = test_env();
    seed_user(&env, "dave", "correct-pw", Role::Admin).await;
    let principal = env.authenticator.login("dave", "correct-pw").await.unwrap();
    let session_id = env.sessions.create(&principal).await.unwrap();

    assert!(env.sessions.resolve(&session_id).await.unwrap().is_some());

    env.sessions.destroy(&session_id).await.unwrap();
    assert!(env.sessions.resolve(&session_id).await.unwrap().is_none());

    // Destroying again is not an error.
    env.sessions.destroy(&session_id).await.unwrap();
}

#[tokio::test]
async fn expired_session_resolves_to_none_without_explicit_destruction() {
    let env = test_env();
    let user = seed_user(&env, "erin", "correct-pw", Role::Teacher).await;

    // Plant an already-expired record under a well-formed id.
    let session_id = "a".repeat(64);
    env.store
        .put(
            &session_id,
            &SessionRecord {
                user_id: user.id,
                created_at: Utc::now() - ChronoDuration::hours(25),
                expires_at: Utc::now() - ChronoDuration::hours(1),
            },
        )
        .await
        .unwrap();

    assert!(env.sessions.resolve(&session_id).await.unwrap().is_none());
}

#[tokio::test]
async fn session_for_a_deleted_user_is_invalid() {
    let env = test_env();
    let user = seed_user(&env, "frank", "correct-pw", Role::Teacher).await;
    let principal = env.authenticator.login("frank", "correct-pw").await.unwrap();
    let session_id = env.sessions.create(&principal).await.unwrap();

    env.users.remove(user.id).await;

    assert!(env.sessions.resolve(&session_id).await.unwrap().is_none());
}

#[tokio::test]
async fn malformed_session_ids_degrade_to_unauthenticated() {
    let env = test_env();
    for candidate in ["", "short", "definitely not hex!", &"z".repeat(64)] {
        assert!(env.sessions.resolve(candidate).await.unwrap().is_none());
    }
}

#[tokio::test]
async fn repeated_failures_lock_the_username() {
    let env = test_env();
    seed_user(&env, "grace", "correct-pw", Role::Teacher).await;

    for _ in 0..3 {
        let err = env.authenticator.login("grace", "wrong-pw").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    // Locked now, even with the right password.
    let err = env
        .authenticator
        .login("grace", "correct-pw")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::RateLimited));
}

#[tokio::test]
async fn registration_enforces_shape_and_uniqueness() {
    let env = test_env();
    seed_user(&env, "heidi", "correct-pw", Role::Teacher).await;

    let duplicate = env
        .authenticator
        .register(NewUser {
            username: "HEIDI".to_string(),
            password: "another-pw".to_string(),
            role: Role::Student,
        })
        .await
        .unwrap_err();
    assert!(matches!(duplicate, AuthError::UsernameTaken));

    let bad_username = env
        .authenticator
        .register(NewUser {
            username: "x".to_string(),
            password: "long-enough".to_string(),
            role: Role::Student,
        })
        .await
        .unwrap_err();
    assert!(matches!(bad_username, AuthError::Validation(_)));

    let short_password = env
        .authenticator
        .register(NewUser {
            username: "ivan_the_new".to_string(),
            password: "short".to_string(),
            role: Role::Student,
        })
        .await
        .unwrap_err();
    assert!(matches!(short_password, AuthError::Validation(_)));
}

#[tokio::test]
async fn stored_digest_is_not_the_plaintext_and_verifies() {
    let env = test_env();
    seed_user(&env, "judy", "plaintext-pw", Role::Admin).await;

    let stored = env
        .users
        .find_by_username("judy")
        .await
        .unwrap()
        .unwrap()
        .password_digest;

    assert_ne!(stored, "plaintext-pw");
    assert!(!stored.contains("plaintext-pw"));
    assert!(auth::password::verify("plaintext-pw", &stored));
}
