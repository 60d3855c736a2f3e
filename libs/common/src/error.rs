//! Infrastructure error types shared across services.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Errors surfaced by the database layer.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish or acquire a connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Configuration problem (missing or unparseable settings)
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Errors surfaced by the Redis-backed key/value layer.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Failed to reach the Redis server
    #[error("Redis connection error: {0}")]
    Connection(#[source] redis::RedisError),

    /// A command failed against an established connection
    #[error("Redis command error: {0}")]
    Command(#[source] redis::RedisError),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Type alias for Result with CacheError
pub type CacheResult<T> = Result<T, CacheError>;
