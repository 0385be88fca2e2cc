pub mod health;
pub mod pastes;
pub mod schemas;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use burnbin_gateway::PasteOrchestrator;

/// Request limits enforced by the HTTP layer.
#[derive(Debug, Clone, Copy)]
pub struct ApiLimits {
    /// Largest accepted upload body.
    pub max_body_bytes: usize,
    /// Longest lifetime an upload may request.
    pub max_ttl: Duration,
}

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The paste orchestrator.
    pub orchestrator: Arc<PasteOrchestrator>,
    pub limits: ApiLimits,
}

/// Build the Axum router with all API routes and middleware.
pub fn router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.limits.max_body_bytes);

    Router::new()
        .route("/health", get(health::health))
        .route("/metrics", get(health::metrics))
        .route(
            "/api/pastes",
            axum::routing::post(pastes::create_paste).layer(body_limit),
        )
        .route("/api/pastes/{id}", get(pastes::read_paste))
        .route("/{id}", get(pastes::read_paste))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
