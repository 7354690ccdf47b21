use crate::room::RoomManager;

/// Shared state handed to every axum handler.
#[derive(Clone)]
pub struct RelayState {
    pub rooms: RoomManager,
}

impl RelayState {
    pub fn new(rooms: RoomManager) -> Self {
        Self { rooms }
    }
}
