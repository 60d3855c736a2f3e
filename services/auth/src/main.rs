use std::sync::Arc;

use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use auth::activity::PgActivityLog;
use auth::authenticator::Authenticator;
use auth::repositories::{PgStudentLinkStore, PgUserStore};
use auth::session::{SessionConfig, SessionManager};
use auth::store::{MemorySessionStore, RedisSessionStore, SessionStore};
use auth::throttle::LoginThrottle;
use auth::{AppState, routes};

use common::{cache, database};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting authentication service");

    // Initialize database connection pool
    let db_config = database::DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    // Pick the session backing store: Redis by default, in-memory for
    // offline development (SESSION_STORE=memory).
    let session_store: Arc<dyn SessionStore> = match std::env::var("SESSION_STORE").as_deref() {
        Ok("memory") => {
            info!("Using in-memory session store");
            Arc::new(MemorySessionStore::new())
        }
        _ => {
            let redis_config = cache::RedisConfig::from_env()?;
            let redis_pool = cache::RedisPool::new(&redis_config).await?;
            Arc::new(RedisSessionStore::new(redis_pool))
        }
    };

    let session_config = SessionConfig::from_env()?;

    let users = Arc::new(PgUserStore::new(pool.clone()));
    let students = Arc::new(PgStudentLinkStore::new(pool.clone()));
    let activity = Arc::new(PgActivityLog::new(pool.clone()));

    let authenticator = Authenticator::new(
        users.clone(),
        students.clone(),
        activity.clone(),
        LoginThrottle::default(),
    );
    let sessions = SessionManager::new(session_store, users.clone(), students, session_config);

    let app_state = AppState {
        db_pool: pool,
        sessions,
        authenticator,
        users,
        activity,
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Authentication service listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
