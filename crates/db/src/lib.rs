//! PostgreSQL persistence for Iterra.
//!
//! Owns the connection pool, embedded migrations, the row models, and the
//! repositories. [`usage_store::PgUsageStore`] adapts the usage-counter
//! repository to the rate limiter's store trait.

use sqlx::postgres::PgPoolOptions;

pub mod models;
pub mod repositories;
pub mod usage_store;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Run a trivial query to confirm the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply all pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
