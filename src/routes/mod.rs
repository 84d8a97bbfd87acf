//! Route definitions for the dashboard API.

pub mod dashboard;
pub mod health;

use axum::extract::State;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{AllowHeaders, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::catalog::Chart;
use crate::config::AppConfig;
use crate::AppState;

/// Build the full application router.
pub fn router(state: AppState, config: &AppConfig) -> Router {
    Router::new()
        .route("/api/health", get(health::live))
        .route("/api/health/ready", get(health::ready))
        .route("/api/stats", get(dashboard::stats))
        .merge(chart_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config.frontend_origin.clone()))
        .with_state(state)
}

/// One `GET /api/charts/<slug>` route per catalog entry.
fn chart_routes() -> Router<AppState> {
    Chart::ALL.into_iter().fold(Router::new(), |router, chart| {
        router.route(
            &format!("/api/charts/{}", chart.slug()),
            get(move |state: State<AppState>| dashboard::chart(state, chart)),
        )
    })
}

/// Only the configured frontend origin may call the API with credentials.
pub fn cors_layer(origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
