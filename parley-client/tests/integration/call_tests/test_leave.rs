use parley_client::CallState;
use serde_json::json;

use crate::integration::init_tracing;
use crate::utils::{MockBackend, RawPeer, client_config, spawn_client, spawn_relay};

#[tokio::test]
async fn test_leave_when_idle_is_a_noop() {
    init_tracing();

    let addr = spawn_relay().await;
    let media = MockBackend::new("alice");
    let (alice, mut events) = spawn_client(client_config(addr), &media);

    alice.leave().await;
    alice.leave().await;

    events.settle().await;
    assert!(events.is_empty(), "Idle leave produced events");
    assert_eq!(alice.state(), CallState::Idle);
    assert_eq!(media.captures(), 0);
}

#[tokio::test]
async fn test_leave_is_sent_once() {
    init_tracing();

    let addr = spawn_relay().await;
    let (mut peer, _) = RawPeer::join(addr, "once").await.expect("Join failed");

    let media = MockBackend::new("bob");
    let (bob, mut events) = spawn_client(client_config(addr), &media);
    bob.join("once").await.expect("Bob failed to join");
    peer.recv_type("peer-joined").await.unwrap();

    bob.leave().await;
    bob.leave().await;
    events.wait_for_state(CallState::Idle).await.unwrap();

    assert_eq!(peer.recv_json().await.unwrap(), json!({ "type": "leave" }));
    peer.expect_silence().await.expect("Leave was sent more than once");
    assert_eq!(media.live_tracks(), 0);
}

#[tokio::test]
async fn test_dropping_handle_hangs_up() {
    init_tracing();

    let addr = spawn_relay().await;
    let (mut peer, _) = RawPeer::join(addr, "drop").await.expect("Join failed");

    let media = MockBackend::new("bob");
    let (bob, _events) = spawn_client(client_config(addr), &media);
    bob.join("drop").await.expect("Bob failed to join");
    peer.recv_type("peer-joined").await.unwrap();

    drop(bob);

    assert_eq!(peer.recv_json().await.unwrap(), json!({ "type": "leave" }));
}
