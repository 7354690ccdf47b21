use crate::RelayError;
use crate::signaling::{Envelope, RelayState};
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use parley_core::{ConnectionId, RoomId};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    pub room: Option<String>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<RelayState>,
) -> impl IntoResponse {
    // Read once; the room never changes for the life of the connection.
    let room = match params.room.as_deref().map(RoomId::parse) {
        Some(Ok(room)) => Some(room),
        Some(Err(e)) => {
            warn!("Ignoring invalid room id: {}", e);
            None
        }
        None => None,
    };

    ws.on_upgrade(move |socket| handle_socket(socket, room, state))
}

async fn handle_socket(socket: WebSocket, room: Option<RoomId>, state: RelayState) {
    let conn_id = ConnectionId::new();
    info!("New WebSocket connection: {} (room {:?})", conn_id, room);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    let membership = match &room {
        Some(room_id) => match state.rooms.join(room_id, conn_id, tx.clone()).await {
            Ok(membership) => Some(membership),
            Err(e) => {
                match e {
                    RelayError::RoomFull { .. } => warn!("{} rejected: {}", conn_id, e),
                    RelayError::RoomClosed => error!("{} could not join '{}': {}", conn_id, room_id, e),
                }
                // Flush the room-full notice, then close.
                let _ = tx.send(Message::Close(None));
                drop(tx);
                while let Some(msg) = rx.recv().await {
                    let closing = matches!(msg, Message::Close(_));
                    if sender.send(msg).await.is_err() || closing {
                        break;
                    }
                }
                info!("WebSocket disconnected: {}", conn_id);
                return;
            }
        },
        None => {
            warn!("Connection {} opened without a room; its frames will be dropped", conn_id);
            None
        }
    };
    drop(tx);

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let recv_loop = async {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    let Some(membership) = &membership else {
                        warn!("Dropping frame from {}: not joined to any room", conn_id);
                        continue;
                    };
                    let Some(kind) = Envelope::peek(text.as_str()) else {
                        warn!("Dropping malformed frame from {}", conn_id);
                        continue;
                    };
                    if let Err(e) = membership.forward(kind, text).await {
                        error!("Room died: {}", e);
                        break;
                    }
                }
                Message::Binary(_) => warn!("Dropping binary frame from {}", conn_id),
                Message::Close(_) => break,
                _ => {}
            }
        }
    };

    tokio::select! {
        _ = (&mut send_task) => {}
        _ = recv_loop => send_task.abort(),
    };

    if let Some(membership) = membership {
        membership.leave().await;
    }
    info!("WebSocket disconnected: {}", conn_id);
}
