pub mod campaigns;
pub mod engine;
pub mod health;
pub mod jobs;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /campaigns/{campaign_id}/visuals     submit posts (POST)
/// /campaigns/{campaign_id}/status      campaign rollup (GET)
/// /jobs/{id}                           job snapshot (GET)
/// /jobs/{id}/progress                  progress record (GET)
/// /jobs/{id}/cancel                    cancel queued job (POST)
/// /engine/stats                        worker pool and queue stats (GET)
/// ```
///
/// The event stream lives in [`stream_routes`] so it is not subject to
/// the request timeout.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/campaigns", campaigns::router())
        .nest("/jobs", jobs::router())
        .nest("/engine", engine::router())
}

/// Long-lived routes, mounted with full paths outside the request timeout.
///
/// ```text
/// /api/v1/events                       job event stream, SSE (GET)
/// ```
pub fn stream_routes() -> Router<AppState> {
    Router::new().route("/api/v1/events", get(handlers::events::stream_events))
}
