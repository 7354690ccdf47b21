use parley_client::{ClientConfig, ClientHandle, NegotiationClient, RelayAddress};
use parley_relay::{RelayConfig, RoomPolicy, serve_with_listener};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

use super::event_log::EventLog;
use super::mock_backend::MockBackend;

/// Timeout for a single expected event or frame (ms).
pub const EVENT_TIMEOUT_MS: u64 = 3000;

/// How long to listen before concluding nothing happened (ms).
pub const SILENCE_MS: u64 = 200;

/// Start a relay with the default two-member policy on an ephemeral port.
pub async fn spawn_relay() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test relay");
    let addr = listener.local_addr().expect("No local address");

    let config = RelayConfig {
        bind: addr,
        policy: RoomPolicy::default(),
        ..RelayConfig::default()
    };

    tokio::spawn(async move {
        if let Err(e) = serve_with_listener(listener, config, std::future::pending()).await {
            tracing::error!("Test relay stopped: {:?}", e);
        }
    });

    addr
}

/// Client settings pointing at `addr`, with short timeouts and no ICE servers.
pub fn client_config(addr: SocketAddr) -> ClientConfig {
    let relay = RelayAddress::parse(&format!("ws://{}/ws", addr)).expect("Bad relay address");
    ClientConfig {
        relay: Some(relay),
        ice_servers: vec![],
        connect_timeout: Duration::from_secs(2),
        join_timeout: Duration::from_secs(2),
        negotiation_timeout: Duration::from_secs(2),
    }
}

pub fn spawn_client(config: ClientConfig, backend: &MockBackend) -> (ClientHandle, EventLog) {
    let (handle, events) = NegotiationClient::spawn(config, backend.clone());
    (handle, EventLog::new(events))
}
