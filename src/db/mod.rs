//! PostgreSQL pool and schema setup for the lending store

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::config::Config;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Lending database unreachable: {0}")]
    Connect(String),

    #[error("Lending schema migration failed: {0}")]
    Migrate(String),

    #[error("Lending database ping failed: {0}")]
    Ping(String),
}

/// Pool shared by every service in `AppState`
pub async fn create_pool(config: &Config) -> Result<PgPool, DbError> {
    tracing::info!(
        url = %config.database_url_masked(),
        max_connections = config.db_max_connections,
        "Opening lending database pool"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .connect(&config.database_url)
        .await
        .map_err(|e| DbError::Connect(e.to_string()))?;

    Ok(pool)
}

/// Applies the users, vouches, policies, loans, payments, notifications and
/// waitlist schema
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DbError::Migrate(e.to_string()))?;

    tracing::info!("Lending schema is up to date");

    Ok(())
}

/// Used by `/health`; failure turns the response into 503
pub async fn check_health(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(|e| DbError::Ping(e.to_string()))?;

    Ok(())
}
