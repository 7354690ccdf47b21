use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("room is full ({capacity} members)")]
    RoomFull { capacity: usize },

    /// The room task shut down while the command was in flight.
    #[error("room closed")]
    RoomClosed,
}
