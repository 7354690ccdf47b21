use parley_relay::RoomPolicy;

use crate::integration::init_tracing;
use crate::utils::{TestPeer, spawn_relay};

#[tokio::test]
async fn test_rooms_are_isolated() {
    init_tracing();

    let addr = spawn_relay(RoomPolicy::default()).await;

    let (mut red_a, _) = TestPeer::join(addr, "red").await.expect("Join failed");
    let (mut red_b, _) = TestPeer::join(addr, "red").await.expect("Join failed");
    let (mut blue_a, joined) = TestPeer::join(addr, "blue").await.expect("Join failed");
    assert!(joined.contains("initiator"), "Blue is a separate room: {}", joined);
    red_a.recv_text().await.expect("No peer-joined notice");

    red_b.send_text(r#"{"type":"leave"}"#).await.expect("Send failed");

    assert_eq!(red_a.recv_text().await.expect("Not forwarded"), r#"{"type":"leave"}"#);
    blue_a.expect_silence().await.expect("Other rooms must not see it");
}
