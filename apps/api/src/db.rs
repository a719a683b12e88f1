use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use tracing::info;

/// Creates a PostgreSQL connection pool and applies pending migrations.
pub async fn create_pool(database_url: &str, log_queries: bool) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let mut options =
        PgConnectOptions::from_str(database_url).context("DATABASE_URL is not a valid URL")?;
    if !log_queries {
        options = options.disable_statement_logging();
    }

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}
