//! Database operations for storefront `PostgreSQL`.
//!
//! # Database: `opaline_storefront`
//!
//! The backend order service is source of truth for carts, orders, and
//! profiles; the only local table is session storage:
//!
//! ## Tables
//!
//! - `tower_sessions.session` - Tower-sessions storage, created via
//!   `PostgresStore::migrate` at startup

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
