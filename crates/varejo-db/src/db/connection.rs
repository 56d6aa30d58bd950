use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use varejo_core::TenancyConfig;

/// Open the connection pool described by the configuration.
#[tracing::instrument(skip(config), fields(max_connections = config.db_max_connections))]
pub async fn connect(config: &TenancyConfig) -> Result<PgPool, anyhow::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Database connection pool established");
    Ok(pool)
}
