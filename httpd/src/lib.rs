pub mod context;
pub mod error;
pub mod routes;

pub use context::AppContext;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

/// Builds the facade's router over a shared `AppContext`. Each request runs under a 300s budget,
/// wrapping whatever `process_url`/`answer` call it triggers.
pub fn build_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/ingest", post(routes::ingest))
        .route("/snapshot", get(routes::snapshot))
        .route("/stats", get(routes::stats))
        .route("/health", get(routes::health))
        .route("/status", get(routes::status))
        .route("/query", post(routes::query))
        .layer(tower_http::timeout::TimeoutLayer::new(Duration::from_secs(300)))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
