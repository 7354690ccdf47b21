use crate::ClientError;
use futures::{SinkExt, StreamExt};
use parley_core::{InboundFrame, NegotiationMessage};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use url::Url;

/// How long `close` waits for the close frame to be flushed.
const CLOSE_GRACE: Duration = Duration::from_millis(500);

/// A client's websocket to the relay.
///
/// Outgoing frames go through a writer task in send order; incoming text
/// frames are parsed into [`InboundFrame`]s by a reader task. `recv`
/// returning `None` means the relay connection is gone.
pub struct RelayConnection {
    outbound: mpsc::UnboundedSender<Message>,
    inbound: mpsc::UnboundedReceiver<InboundFrame>,
    writer: JoinHandle<()>,
    reader: JoinHandle<()>,
}

impl RelayConnection {
    pub async fn connect(url: &Url, timeout: Duration) -> Result<Self, ClientError> {
        info!("Connecting to relay at {}", url);

        let (ws, _response) = tokio::time::timeout(timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| {
                ClientError::Transport(format!("no answer from {} within {:?}", url, timeout))
            })?
            .map_err(|e| ClientError::Transport(format!("{}: {}", url, e)))?;

        let (mut write, mut read) = ws.split();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
        let (inbound_tx, inbound) = mpsc::unbounded_channel();

        let writer = tokio::spawn(async move {
            while let Some(msg) = outbound_rx.recv().await {
                let closing = matches!(msg, Message::Close(_));
                if let Err(e) = write.send(msg).await {
                    debug!("Relay write failed: {}", e);
                    break;
                }
                if closing {
                    break;
                }
            }
            let _ = write.close().await;
        });

        let reader = tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<InboundFrame>(text.as_str()) {
                            Ok(frame) => {
                                if inbound_tx.send(frame).is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!("Ignoring malformed relay frame: {}", e),
                        }
                    }
                    Ok(Message::Binary(_)) => warn!("Ignoring binary relay frame"),
                    Ok(Message::Close(frame)) => {
                        debug!("Relay closed the connection: {:?}", frame);
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Relay connection error: {}", e);
                        break;
                    }
                }
            }
        });

        Ok(Self {
            outbound,
            inbound,
            writer,
            reader,
        })
    }

    pub fn send(&self, msg: &NegotiationMessage) -> Result<(), ClientError> {
        let json = serde_json::to_string(msg)
            .map_err(|e| ClientError::Transport(format!("cannot encode {:?}: {}", msg.kind(), e)))?;

        self.outbound
            .send(Message::Text(json.into()))
            .map_err(|_| ClientError::Transport("relay connection closed".to_owned()))
    }

    pub async fn recv(&mut self) -> Option<InboundFrame> {
        self.inbound.recv().await
    }

    /// Flush everything queued so far, then close the websocket.
    pub async fn close(mut self) {
        let _ = self.outbound.send(Message::Close(None));
        if tokio::time::timeout(CLOSE_GRACE, &mut self.writer).await.is_err() {
            debug!("Relay close frame not flushed within {:?}", CLOSE_GRACE);
        }
    }
}

impl Drop for RelayConnection {
    fn drop(&mut self) {
        self.writer.abort();
        self.reader.abort();
    }
}
