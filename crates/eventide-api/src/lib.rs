//! Eventide — HTTP inspector and control API.
//!
//! Exposes the event runtime over JSON: start and steer events, play
//! cutscenes, read and edit the world state, save and load slots, and
//! install script bundles.

pub mod error;
pub mod routes;
pub mod state;

#[cfg(test)]
mod testing;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the full application router.
pub fn app(state: AppState) -> Router {
    // TODO: Replace CorsLayer::permissive() with restricted origins once the inspector UI has a fixed host.
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/events", routes::events::router())
        .nest("/api/v1/cutscenes", routes::cutscenes::router())
        .nest("/api/v1/world", routes::world_state::router())
        .nest("/api/v1/content", routes::content::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
