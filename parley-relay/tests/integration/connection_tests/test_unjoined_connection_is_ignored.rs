use parley_relay::RoomPolicy;

use crate::integration::init_tracing;
use crate::utils::{TestPeer, spawn_relay};

#[tokio::test]
async fn test_unjoined_connection_is_ignored() {
    init_tracing();

    let addr = spawn_relay(RoomPolicy::default()).await;

    let (mut member, _) = TestPeer::join(addr, "room42").await.expect("Join failed");

    let mut stranger = TestPeer::connect(addr, None)
        .await
        .expect("Connection without room should be accepted");
    stranger
        .send_text(r#"{"type":"candidate","candidate":{"candidate":"candidate:1 1 udp 1 10.0.0.1 9 typ host"}}"#)
        .await
        .expect("Send failed");

    member.expect_silence().await.expect("Candidate must not be forwarded");
    stranger.expect_silence().await.expect("Nothing is sent back");

    // Still connected afterwards.
    stranger.send_text(r#"{"type":"leave"}"#).await.expect("Socket should stay open");
}

#[tokio::test]
async fn test_blank_room_is_not_joined() {
    init_tracing();

    let addr = spawn_relay(RoomPolicy::default()).await;

    let (mut member, _) = TestPeer::join(addr, "room42").await.expect("Join failed");
    let mut blank = TestPeer::connect(addr, Some("%20%20"))
        .await
        .expect("Connection should be accepted");

    blank.expect_silence().await.expect("No joined notice for a blank room");
    blank.send_text(r#"{"type":"leave"}"#).await.expect("Send failed");
    member.expect_silence().await.expect("Nothing forwarded");
}
