use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::config::Config;

/// Creates the PostgreSQL pool backing the subscriber store and the job
/// corpus. Sized from config: dispatch runs are sequential, so the pool
/// mostly serves the HTTP surface.
pub async fn create_pool(config: &Config) -> Result<PgPool> {
    info!("Connecting to the job-alerts database...");

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    info!(
        "Job-alerts database pool ready ({} max connections)",
        config.database_max_connections
    );
    Ok(pool)
}
