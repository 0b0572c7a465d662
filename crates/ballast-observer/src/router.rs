//! Axum router construction for the observer API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS and request tracing enabled.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::operator;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the observer.
///
/// The router includes:
/// - `GET /` -- HTML counter sign
/// - `GET /ws/events` -- `WebSocket` zone event stream, scoped by `?player=` / `?room=`
/// - `GET /api/status` -- capacity, danger level and pool
/// - `GET /api/players/{id}` -- a player's balances, standing and possessions
/// - `GET /api/shops` -- shop counters
/// - `GET /api/shops/{id}` -- one counter's listings with current prices
/// - `GET /api/shelves` -- display shelves
/// - `GET /api/operator/status` -- runner state
///
/// Every route is read-only.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/ws/events", get(ws::ws_events))
        .route("/api/status", get(handlers::get_status))
        .route("/api/players/{id}", get(handlers::get_player))
        .route("/api/shops", get(handlers::list_shops))
        .route("/api/shops/{id}", get(handlers::get_shop))
        .route("/api/shelves", get(handlers::list_shelves))
        .route("/api/operator/status", get(operator::get_status))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
