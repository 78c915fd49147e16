//! Vegas Game Server Library
//!
//! Everything the binary needs — the session actor, the WebSocket transport
//! and the router — lives here so integration tests can run the server
//! in-process.

pub mod state;
pub mod ws;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};

use state::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
