use crate::RelayError;
use crate::config::RoomPolicy;
use crate::room::members::{RoomMembers, notice_message};
use crate::room::room_command::RoomCommand;
use crate::room::room_manager::RoomRegistry;
use axum::extract::ws::{Message, Utf8Bytes};
use parley_core::{ConnectionId, MessageKind, RelayNotice, Role, RoomId};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// One room's task. Owns the membership set and applies join, forward and
/// leave commands strictly in arrival order.
pub struct Room {
    id: RoomId,
    policy: RoomPolicy,
    members: RoomMembers,
    command_rx: mpsc::Receiver<RoomCommand>,
    registration: Option<(RoomRegistry, u64)>,
}

impl Room {
    pub fn new(id: RoomId, policy: RoomPolicy, command_rx: mpsc::Receiver<RoomCommand>) -> Self {
        Self {
            id,
            policy,
            members: RoomMembers::new(),
            command_rx,
            registration: None,
        }
    }

    /// Remove the registry entry tagged `generation` once the room empties.
    pub(crate) fn registered(mut self, registry: RoomRegistry, generation: u64) -> Self {
        self.registration = Some((registry, generation));
        self
    }

    pub async fn run(mut self) {
        info!("Room '{}' event loop started", self.id);

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd);

            if self.members.is_empty() {
                info!("Room '{}' is empty. Shutting down.", self.id);
                break;
            }
        }

        self.shutdown().await;
        info!("Room '{}' event loop finished", self.id);
    }

    fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join {
                conn_id,
                outbound,
                reply,
            } => self.join(conn_id, outbound, reply),

            RoomCommand::Forward {
                conn_id,
                kind,
                frame,
            } => self.forward(conn_id, kind, frame),

            RoomCommand::Leave { conn_id } => {
                if self.members.remove(&conn_id) {
                    info!(
                        "Connection {} left room '{}' ({} remaining)",
                        conn_id,
                        self.id,
                        self.members.len()
                    );
                } else {
                    debug!("Leave for {} ignored: not a member of '{}'", conn_id, self.id);
                }
            }
        }
    }

    fn join(
        &mut self,
        conn_id: ConnectionId,
        outbound: mpsc::UnboundedSender<Message>,
        reply: oneshot::Sender<Result<Role, RelayError>>,
    ) {
        if let Some(capacity) = self.policy.max_members {
            if self.members.len() >= capacity {
                warn!(
                    "Room '{}' is full ({} members), rejecting {}",
                    self.id, capacity, conn_id
                );
                if let Some(msg) = notice_message(&RelayNotice::RoomFull { capacity }) {
                    let _ = outbound.send(msg);
                }
                let _ = reply.send(Err(RelayError::RoomFull { capacity }));
                return;
            }
        }

        if self.members.contains(&conn_id) {
            warn!("Connection {} joined room '{}' twice", conn_id, self.id);
            self.members.remove(&conn_id);
        }

        let peers = self.members.len();
        let role = if peers == 0 {
            Role::Initiator
        } else {
            Role::Responder
        };

        if let Some(msg) = notice_message(&RelayNotice::Joined { role, peers }) {
            let _ = outbound.send(msg);
        }
        if let Some(msg) = notice_message(&RelayNotice::PeerJoined) {
            self.members.broadcast_except(&conn_id, &msg);
        }
        self.members.insert(conn_id, outbound);

        info!(
            "Connection {} joined room '{}' as {:?} ({} members)",
            conn_id,
            self.id,
            role,
            self.members.len()
        );

        if reply.send(Ok(role)).is_err() {
            debug!("Join reply for {} dropped by caller", conn_id);
        }
    }

    fn forward(&mut self, conn_id: ConnectionId, kind: MessageKind, frame: Utf8Bytes) {
        if !self.members.contains(&conn_id) {
            warn!(
                "Dropping {:?} from {}: not a member of '{}'",
                kind, conn_id, self.id
            );
            return;
        }

        let delivered = self
            .members
            .broadcast_except(&conn_id, &Message::Text(frame));

        if delivered == 0 {
            debug!(
                "Dropping {:?} from {}: no other members in '{}'",
                kind, conn_id, self.id
            );
        } else {
            debug!(
                "Forwarded {:?} from {} to {} member(s) of '{}'",
                kind, conn_id, delivered, self.id
            );
        }
    }

    async fn shutdown(&mut self) {
        if let Some((registry, generation)) = self.registration.take() {
            registry.remove_if(&self.id, |_, handle| handle.generation == generation);
        }

        // Joins that raced the shutdown are bounced so the caller can retry
        // against a fresh room.
        self.command_rx.close();
        while let Some(cmd) = self.command_rx.recv().await {
            if let RoomCommand::Join { reply, .. } = cmd {
                let _ = reply.send(Err(RelayError::RoomClosed));
            }
        }
    }
}
