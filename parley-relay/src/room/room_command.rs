use crate::RelayError;
use axum::extract::ws::{Message, Utf8Bytes};
use parley_core::{ConnectionId, MessageKind, Role};
use tokio::sync::{mpsc, oneshot};

/// Commands a room task processes, one at a time, in arrival order.
#[derive(Debug)]
pub enum RoomCommand {
    /// Register a connection. `outbound` feeds the connection's socket writer.
    Join {
        conn_id: ConnectionId,
        outbound: mpsc::UnboundedSender<Message>,
        reply: oneshot::Sender<Result<Role, RelayError>>,
    },

    /// Deliver `frame` verbatim to every other member.
    Forward {
        conn_id: ConnectionId,
        kind: MessageKind,
        frame: Utf8Bytes,
    },

    /// Drop the connection from the room. Repeating it is harmless.
    Leave { conn_id: ConnectionId },
}
