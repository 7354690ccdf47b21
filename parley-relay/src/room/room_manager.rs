use crate::RelayError;
use crate::config::RoomPolicy;
use crate::room::{Room, RoomCommand};
use axum::extract::ws::{Message, Utf8Bytes};
use dashmap::DashMap;
use parley_core::{ConnectionId, MessageKind, Role, RoomId};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

/// Attempts made when a join races a room shutting down.
const JOIN_ATTEMPTS: usize = 3;

pub(crate) struct RoomHandle {
    pub(crate) commands: mpsc::Sender<RoomCommand>,
    pub(crate) generation: u64,
}

pub(crate) type RoomRegistry = Arc<DashMap<RoomId, RoomHandle>>;

/// Creates rooms on first join and hands out their command queues.
#[derive(Clone)]
pub struct RoomManager {
    rooms: RoomRegistry,
    policy: RoomPolicy,
    next_generation: Arc<AtomicU64>,
}

impl RoomManager {
    pub fn new(policy: RoomPolicy) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            policy,
            next_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn policy(&self) -> &RoomPolicy {
        &self.policy
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn contains_room(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn get_room_sender(&self, room_id: &RoomId) -> mpsc::Sender<RoomCommand> {
        if let Some(handle) = self.rooms.get(room_id) {
            return handle.commands.clone();
        }

        self.rooms
            .entry(room_id.clone())
            .or_insert_with(|| {
                info!("Creating new room: {}", room_id);
                let (tx, rx) = mpsc::channel(self.policy.command_buffer);
                let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

                let room = Room::new(room_id.clone(), self.policy.clone(), rx)
                    .registered(self.rooms.clone(), generation);
                tokio::spawn(room.run());

                RoomHandle {
                    commands: tx,
                    generation,
                }
            })
            .commands
            .clone()
    }

    /// Register `conn_id` in `room_id`, creating the room if needed.
    pub async fn join(
        &self,
        room_id: &RoomId,
        conn_id: ConnectionId,
        outbound: mpsc::UnboundedSender<Message>,
    ) -> Result<RoomMembership, RelayError> {
        for _ in 0..JOIN_ATTEMPTS {
            let commands = self.get_room_sender(room_id);
            let (reply, reply_rx) = oneshot::channel();

            let cmd = RoomCommand::Join {
                conn_id,
                outbound: outbound.clone(),
                reply,
            };
            if commands.send(cmd).await.is_err() {
                self.rooms
                    .remove_if(room_id, |_, handle| handle.commands.same_channel(&commands));
                continue;
            }

            match reply_rx.await {
                Ok(Ok(role)) => {
                    return Ok(RoomMembership {
                        room_id: room_id.clone(),
                        conn_id,
                        role,
                        commands,
                    });
                }
                Ok(Err(RelayError::RoomClosed)) | Err(_) => {
                    debug!("Room '{}' closed during join of {}, retrying", room_id, conn_id);
                }
                Ok(Err(e)) => return Err(e),
            }
        }

        Err(RelayError::RoomClosed)
    }
}

/// A connection's registration in one room.
pub struct RoomMembership {
    room_id: RoomId,
    conn_id: ConnectionId,
    role: Role,
    commands: mpsc::Sender<RoomCommand>,
}

impl RoomMembership {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn conn_id(&self) -> ConnectionId {
        self.conn_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub async fn forward(&self, kind: MessageKind, frame: Utf8Bytes) -> Result<(), RelayError> {
        self.commands
            .send(RoomCommand::Forward {
                conn_id: self.conn_id,
                kind,
                frame,
            })
            .await
            .map_err(|_| RelayError::RoomClosed)
    }

    /// Consumes the membership, so a connection leaves at most once.
    pub async fn leave(self) {
        let cmd = RoomCommand::Leave {
            conn_id: self.conn_id,
        };
        if self.commands.send(cmd).await.is_err() {
            debug!("Room '{}' already gone when {} left", self.room_id, self.conn_id);
        }
    }
}
