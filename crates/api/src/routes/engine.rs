use axum::routing::get;
use axum::Router;

use crate::handlers::engine;
use crate::state::AppState;

/// Routes mounted at `/engine`.
pub fn router() -> Router<AppState> {
    Router::new().route("/stats", get(engine::get_stats))
}
