use parley_client::{CallState, ClientEvent};

use crate::integration::init_tracing;
use crate::utils::{MockBackend, client_config, spawn_client, spawn_relay};

#[tokio::test]
async fn test_room42_scenario() {
    init_tracing();

    let addr = spawn_relay().await;
    let alice_media = MockBackend::new("alice");
    let bob_media = MockBackend::new("bob");
    let (alice, mut alice_events) = spawn_client(client_config(addr), &alice_media);
    let (bob, mut bob_events) = spawn_client(client_config(addr), &bob_media);

    alice.join("room42").await.expect("Alice failed to join");
    assert_eq!(alice.state(), CallState::Joined);
    bob.join("room42").await.expect("Bob failed to join");

    alice_events
        .wait_for_state(CallState::Connected)
        .await
        .expect("Alice never connected");
    bob_events
        .wait_for_state(CallState::Connected)
        .await
        .expect("Bob never connected");

    let alice_remote = alice_events
        .wait_for(|e| matches!(e, ClientEvent::RemoteAudio(_)))
        .await
        .expect("Alice got no remote audio");
    let bob_remote = bob_events
        .wait_for(|e| matches!(e, ClientEvent::RemoteAudio(_)))
        .await
        .expect("Bob got no remote audio");

    // The remote track carries the description it was negotiated from.
    match (alice_remote, bob_remote) {
        (ClientEvent::RemoteAudio(a), ClientEvent::RemoteAudio(b)) => {
            assert_eq!(a.stream_id, "v=0 answer from bob");
            assert_eq!(b.stream_id, "v=0 offer from alice");
        }
        other => panic!("unexpected events {:?}", other),
    }

    alice_events.settle().await;
    bob_events.settle().await;

    assert_eq!(
        alice_events.states(),
        vec![
            CallState::Connecting,
            CallState::Joined,
            CallState::Offering,
            CallState::Connected
        ]
    );
    assert_eq!(
        bob_events.states(),
        vec![
            CallState::Connecting,
            CallState::Joined,
            CallState::Answering,
            CallState::Connected
        ]
    );

    // Each side applied exactly the other's trickled candidate.
    let alice_candidates = alice_media.applied_candidates();
    assert_eq!(alice_candidates.len(), 1);
    assert!(alice_candidates[0].candidate.starts_with("candidate:bob"));
    let bob_candidates = bob_media.applied_candidates();
    assert_eq!(bob_candidates.len(), 1);
    assert!(bob_candidates[0].candidate.starts_with("candidate:alice"));
}
