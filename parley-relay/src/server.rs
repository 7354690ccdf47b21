use crate::config::RelayConfig;
use crate::room::RoomManager;
use crate::signaling::{RelayState, ws_handler};
use anyhow::Context;
use axum::Router;
use axum::extract::State;
use axum::routing::get;
use std::future::Future;
use tokio::net::TcpListener;
use tracing::info;

pub fn router(state: RelayState, ws_path: &str) -> Router {
    Router::new()
        .route(ws_path, get(ws_handler))
        .route("/health", get(health))
        .with_state(state)
}

async fn health(State(state): State<RelayState>) -> String {
    format!("ok rooms={}", state.rooms.room_count())
}

/// Bind `config.bind` and serve until `shutdown` resolves.
pub async fn serve(
    config: RelayConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind relay on {}", config.bind))?;
    serve_with_listener(listener, config, shutdown).await
}

pub async fn serve_with_listener(
    listener: TcpListener,
    config: RelayConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    config.validate()?;

    let rooms = RoomManager::new(config.policy);
    let addr = listener.local_addr().context("Listener has no local address")?;
    info!(
        "Relay listening on ws://{}{} (max members per room: {:?})",
        addr,
        config.path,
        rooms.policy().max_members
    );

    let app = router(RelayState::new(rooms), &config.path);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Relay server failed")
}
