//! Connection pool management and the warehouse access seam.

pub mod warehouse;

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::{AppConfig, ConfigError};

pub use warehouse::{PgWarehouse, Warehouse};

/// Create a PostgreSQL connection pool. No connection is opened until the
/// first acquire, so an unreachable store does not prevent startup.
pub fn create_pool(config: &AppConfig) -> Result<PgPool, ConfigError> {
    let options = config.connect_options()?;
    Ok(PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(Duration::from_secs(config.database_acquire_timeout_secs))
        .connect_lazy_with(options))
}

/// Acquire a connection and hand it straight back to the pool.
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    let conn = pool.acquire().await?;
    drop(conn);
    Ok(())
}

/// One-off connectivity probe run at startup. Failures are logged only.
pub async fn startup_check(pool: &PgPool) {
    match health_check(pool).await {
        Ok(()) => tracing::info!("Connected to PostgreSQL warehouse"),
        Err(e) => tracing::error!(error = %e, "Error acquiring warehouse connection"),
    }
}
