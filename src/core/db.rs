//! Database bootstrap - Connection pool and embedded migrations

use crate::core::Config;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{info, instrument};

/// Schema migrations, embedded at compile time from `migrations/`
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Opens the pool described by the configuration and brings the schema up to date.
#[instrument(skip(config))]
pub async fn connect(config: &Config) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;

    MIGRATOR.run(&pool).await?;
    info!("Database ready, migrations applied");

    Ok(pool)
}

/// Private in-memory database, used by the test suites.
///
/// An in-memory SQLite database lives as long as its connection, so the pool
/// is pinned to a single connection that never expires.
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    MIGRATOR.run(&pool).await?;

    Ok(pool)
}
