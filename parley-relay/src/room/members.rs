use axum::extract::ws::Message;
use parley_core::{ConnectionId, RelayNotice};
use tokio::sync::mpsc;
use tracing::{debug, error};

struct Member {
    conn_id: ConnectionId,
    outbound: mpsc::UnboundedSender<Message>,
}

/// Membership of a single room, kept in join order.
///
/// Owned by the room task, so every mutation is serialized with the
/// forwards that read it.
#[derive(Default)]
pub struct RoomMembers {
    members: Vec<Member>,
}

impl RoomMembers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, conn_id: &ConnectionId) -> bool {
        self.members.iter().any(|m| &m.conn_id == conn_id)
    }

    pub fn insert(&mut self, conn_id: ConnectionId, outbound: mpsc::UnboundedSender<Message>) {
        self.members.push(Member { conn_id, outbound });
    }

    /// Returns `false` when the connection was not a member.
    pub fn remove(&mut self, conn_id: &ConnectionId) -> bool {
        let Some(index) = self.members.iter().position(|m| &m.conn_id == conn_id) else {
            return false;
        };
        self.members.remove(index);
        true
    }

    /// Send a message to every member except `sender`. Returns how many
    /// members it was handed to.
    pub fn broadcast_except(&self, sender: &ConnectionId, msg: &Message) -> usize {
        let mut delivered = 0;
        for member in self.members.iter().filter(|m| &m.conn_id != sender) {
            if member.outbound.send(msg.clone()).is_ok() {
                delivered += 1;
            } else {
                debug!("Outbound queue of {} already closed", member.conn_id);
            }
        }
        delivered
    }
}

pub(crate) fn notice_message(notice: &RelayNotice) -> Option<Message> {
    match serde_json::to_string(notice) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            error!("Failed to serialize relay notice: {}", e);
            None
        }
    }
}
