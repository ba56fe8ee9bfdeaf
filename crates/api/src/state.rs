use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use vizgen_engine::GenerationEngine;
use vizgen_events::EventBus;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// The generation engine. Workers are started and stopped by `main`.
    pub engine: Arc<GenerationEngine>,
    /// Same bus the engine publishes on; handlers subscribe for SSE.
    pub event_bus: Arc<EventBus>,
    /// Cancelled when the server starts shutting down; ends open streams.
    pub shutdown: CancellationToken,
}
