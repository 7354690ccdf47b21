use anyhow::{Context, Result, bail};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::client_helpers::{EVENT_TIMEOUT_MS, SILENCE_MS};

/// A hand-driven relay member, used to play the other side of a call.
pub struct RawPeer {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl RawPeer {
    /// Connect to `room` and return the peer with its `joined` notice.
    pub async fn join(addr: SocketAddr, room: &str) -> Result<(Self, Value)> {
        let url = format!("ws://{}/ws?room={}", addr, room);
        let (ws, _) = connect_async(url.as_str())
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;
        let mut peer = Self { ws };

        let joined = peer.recv_json().await?;
        if joined["type"] != "joined" {
            bail!("Expected joined notice, got {}", joined);
        }
        Ok((peer, joined))
    }

    pub async fn send_json(&mut self, value: Value) -> Result<()> {
        self.ws
            .send(Message::text(value.to_string()))
            .await
            .context("Failed to send frame")
    }

    pub async fn recv_json(&mut self) -> Result<Value> {
        let deadline = Duration::from_millis(EVENT_TIMEOUT_MS);
        loop {
            let next = tokio::time::timeout(deadline, self.ws.next())
                .await
                .context("Timed out waiting for a frame")?;
            match next {
                Some(Ok(Message::Text(text))) => {
                    return serde_json::from_str(text.as_str()).context("Frame is not JSON");
                }
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                Some(Ok(other)) => bail!("Unexpected frame: {:?}", other),
                Some(Err(e)) => bail!("Socket error: {}", e),
                None => bail!("Socket closed"),
            }
        }
    }

    /// Receive frames until one has the given `type`.
    pub async fn recv_type(&mut self, kind: &str) -> Result<Value> {
        loop {
            let frame = self.recv_json().await?;
            if frame["type"] == kind {
                return Ok(frame);
            }
        }
    }

    pub async fn expect_silence(&mut self) -> Result<()> {
        match tokio::time::timeout(Duration::from_millis(SILENCE_MS), self.ws.next()).await {
            Err(_) => Ok(()),
            Ok(frame) => bail!("Expected silence, got {:?}", frame),
        }
    }
}
