//! Data-store handle injected into the HTTP layer.

use std::fmt::Debug;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::catalog::{ChartSpec, Table};
use crate::errors::AppError;
use crate::models::chart::AggregateRow;

/// Read-only access to the star-schema warehouse.
///
/// Every call borrows a connection for its own duration only; nothing is
/// held between calls.
#[async_trait]
pub trait Warehouse: Debug + Send + Sync {
    /// `COUNT(*)` over a whole table.
    async fn count_rows(&self, table: Table) -> Result<i64, AppError>;

    /// Run one catalog aggregation and return its rows in query order.
    async fn aggregate(&self, spec: &ChartSpec) -> Result<Vec<AggregateRow>, AppError>;

    /// Check that a connection can be obtained.
    async fn ping(&self) -> Result<(), AppError>;
}

/// PostgreSQL-backed [`Warehouse`].
#[derive(Debug, Clone)]
pub struct PgWarehouse {
    pool: PgPool,
}

impl PgWarehouse {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Warehouse for PgWarehouse {
    async fn count_rows(&self, table: Table) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(&table.count_sql())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn aggregate(&self, spec: &ChartSpec) -> Result<Vec<AggregateRow>, AppError> {
        let rows = sqlx::query_as::<_, AggregateRow>(&spec.sql())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn ping(&self) -> Result<(), AppError> {
        super::health_check(&self.pool).await?;
        Ok(())
    }
}
