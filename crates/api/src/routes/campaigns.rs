//! Route definitions for the `/campaigns` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::campaigns;
use crate::state::AppState;

/// Routes mounted at `/campaigns`.
///
/// ```text
/// POST   /{campaign_id}/visuals  -> submit_visuals
/// GET    /{campaign_id}/status   -> get_campaign_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{campaign_id}/visuals", post(campaigns::submit_visuals))
        .route("/{campaign_id}/status", get(campaigns::get_campaign_status))
}
