//! Dashboard aggregation: headline totals and the catalog chart executor.

use crate::catalog::{Chart, Table};
use crate::db::Warehouse;
use crate::errors::AppError;
use crate::models::chart::ChartSeries;
use crate::models::stats::DashboardTotals;

/// Fetch the headline counts, running the three counts concurrently.
pub async fn get_totals(warehouse: &dyn Warehouse) -> Result<DashboardTotals, AppError> {
    let (users, movies, views) = tokio::try_join!(
        warehouse.count_rows(Table::DimUser),
        warehouse.count_rows(Table::DimMovie),
        warehouse.count_rows(Table::FactViews),
    )?;

    Ok(DashboardTotals {
        users,
        movies,
        views,
    })
}

/// Run one chart's catalog aggregation and map it into its response shape.
pub async fn get_chart(warehouse: &dyn Warehouse, chart: Chart) -> Result<ChartSeries, AppError> {
    let spec = chart.spec();
    let rows = warehouse.aggregate(spec).await?;
    let series = ChartSeries::from_rows(spec, rows)?;
    tracing::debug!(chart = chart.slug(), rows = series.len(), "Chart aggregation finished");
    Ok(series)
}
