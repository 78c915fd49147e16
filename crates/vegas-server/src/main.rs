//! Vegas Game Server
//!
//! Hosts a single live session of the Vegas dice game over a WebSocket
//! endpoint. Clients connect to `/ws`, submit commands as JSON frames, and
//! receive every broadcast notification plus their own rejections.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vegas_core::SessionConfig;
use vegas_server::{router, state::AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Base rule seats two; extended variants go up to four.
    let max_seats = std::env::var("VEGAS_MAX_SEATS")
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|n| (2..=4).contains(n))
        .unwrap_or(2);
    info!(max_seats, "configuring session");

    let state = AppState::spawn(SessionConfig { max_seats });
    let app = router(state);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000u16);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = TcpListener::bind(addr).await.expect("bind server port");
    info!("vegas server listening on http://{addr}");

    axum::serve(listener, app).await.expect("server error");
}
