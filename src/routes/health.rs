//! Health check endpoints for liveness and readiness probes.

use axum::{extract::State, http::StatusCode, Json};

use crate::models::stats::{HealthStatus, ReadinessStatus};
use crate::AppState;

/// GET /api/health — liveness; never touches the warehouse.
pub async fn live() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "BI Dashboard running",
    })
}

/// GET /api/health/ready — readiness; checks a warehouse connection can be
/// acquired. The failure cause goes to the log only.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadinessStatus>) {
    match state.warehouse.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadinessStatus {
                status: "ready",
                database: "connected",
            }),
        ),
        Err(e) => {
            tracing::warn!(kind = e.kind(), error = %e, "Warehouse readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessStatus {
                    status: "unavailable",
                    database: "unreachable",
                }),
            )
        }
    }
}
