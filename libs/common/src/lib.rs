//! Shared infrastructure for the campus administration backend.
//!
//! This crate provides the pieces every service needs before it can do
//! anything useful: a PostgreSQL connection pool, a Redis connection
//! wrapper for session-class key/value state, and the infrastructure
//! error types both of them surface.

pub mod cache;
pub mod database;
pub mod error;
