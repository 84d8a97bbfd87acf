use serde::Serialize;

/// Headline counts shown above the charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardTotals {
    pub users: i64,
    pub movies: i64,
    pub views: i64,
}

/// Liveness payload.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
}

/// Readiness payload.
#[derive(Debug, Serialize)]
pub struct ReadinessStatus {
    pub status: &'static str,
    pub database: &'static str,
}
