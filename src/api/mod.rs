//! REST API over a finished aggregate snapshot.
//!
//! Provides GET endpoints:
//! - `/snapshot`: the whole snapshot document
//! - `/coverage`: monthly and hourly coverage with per-month detail
//! - `/summary`: headline figures
//! - `/consistency`: result of the snapshot consistency check
//! - `/series/{group}?view=&series=`: one aggregate series

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;

use crate::engine::ConsistencyReport;
use crate::snapshot::AggregateSnapshot;

/// Immutable application state shared across all request handlers.
///
/// Built once after the aggregation run and wrapped in `Arc`; nothing is
/// written after that, so no locks are needed.
pub struct AppState {
    /// Snapshot served by every endpoint.
    pub snapshot: AggregateSnapshot,
    /// Consistency check of `snapshot`, computed at startup.
    pub consistency: ConsistencyReport,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/snapshot", get(handlers::get_snapshot))
        .route("/coverage", get(handlers::get_coverage))
        .route("/summary", get(handlers::get_summary))
        .route("/consistency", get(handlers::get_consistency))
        .route("/series/{group}", get(handlers::get_series))
        .with_state(state)
}

/// Binds to the given address and serves the API.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
