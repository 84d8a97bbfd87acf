//! Dashboard routes: headline totals and chart series.

use axum::{extract::State, Json};

use crate::catalog::Chart;
use crate::errors::AppError;
use crate::models::chart::ChartSeries;
use crate::models::stats::DashboardTotals;
use crate::services::dashboard;
use crate::AppState;

/// GET /api/stats — user, movie and view-row counts.
pub async fn stats(State(state): State<AppState>) -> Result<Json<DashboardTotals>, AppError> {
    let totals = dashboard::get_totals(state.warehouse.as_ref()).await?;
    Ok(Json(totals))
}

/// GET /api/charts/{slug} — shared handler, bound once per catalog chart.
pub async fn chart(
    State(state): State<AppState>,
    chart: Chart,
) -> Result<Json<ChartSeries>, AppError> {
    let series = dashboard::get_chart(state.warehouse.as_ref(), chart).await?;
    Ok(Json(series))
}
