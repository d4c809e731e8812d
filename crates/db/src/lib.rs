//! Feedback persistence.
//!
//! [`FeedbackStore`] is the abstract store the rest of the system talks
//! to. Two implementations are selected by deployment configuration: a
//! JSON document on disk ([`file_store::FileFeedbackStore`]) and a
//! PostgreSQL table of per-event score rows ([`pg_store::PgFeedbackStore`]).

use sqlx::postgres::PgPoolOptions;

pub mod file_store;
pub mod models;
pub mod pg_store;
pub mod repositories;
pub mod store;

pub use store::{FeedbackStore, StoreError, UpsertOutcome};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to prove the pool can reach the server.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
