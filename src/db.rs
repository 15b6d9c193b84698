use std::time::Duration;

use anyhow::{Context, Result};
use diesel::{Connection, PgConnection};
use diesel_async::{
    AsyncPgConnection,
    pooled_connection::{AsyncDieselConnectionManager, bb8::Pool},
};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness};

use crate::{aliases::DbPool, config::DatabaseConfig};

/// Builds the connection pool.
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.url);
    let pool = Pool::builder()
        .max_size(config.max_connections)
        .connection_timeout(Duration::from_secs(10))
        .build(manager)
        .await
        .context("Failed to build DB connection pool")?;

    Ok(pool)
}

/// Builds a pool without opening any connection up front. Connections are
/// established on first use.
pub fn create_pool_lazy(config: &DatabaseConfig, connection_timeout: Duration) -> DbPool {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.url);
    Pool::builder()
        .max_size(config.max_connections)
        .connection_timeout(connection_timeout)
        .build_unchecked(manager)
}

/// Applies pending embedded migrations on a blocking thread and returns how
/// many were run.
pub async fn run_migrations_blocking(
    migrations: EmbeddedMigrations,
    database_url: &str,
) -> Result<usize> {
    let database_url = database_url.to_owned();

    tokio::task::spawn_blocking(move || -> Result<usize> {
        let mut conn = PgConnection::establish(&database_url)
            .context("Failed to connect to the database for migrations")?;
        let applied = conn
            .run_pending_migrations(migrations)
            .map_err(|err| anyhow::anyhow!("Failed to run migrations: {}", err))?;
        Ok(applied.len())
    })
    .await
    .context("Migration task panicked")?
}
