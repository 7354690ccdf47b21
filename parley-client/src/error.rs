use parley_core::RoomIdError;
use thiserror::Error;

/// Failures reported by the media collaborators.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("no audio input available: {0}")]
    Unavailable(String),

    #[error("media session error: {0}")]
    Session(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("a room id is required: {0}")]
    Input(#[from] RoomIdError),

    #[error("cannot use the microphone: {0}")]
    Permission(MediaError),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("relay connection failed: {0}")]
    Transport(String),

    #[error("room is full ({capacity} members)")]
    RoomFull { capacity: usize },

    #[error("negotiation failed: {0}")]
    Negotiation(String),

    #[error("a call is already in progress")]
    Busy,

    #[error("join cancelled")]
    Cancelled,

    #[error("client has shut down")]
    Closed,
}

impl From<MediaError> for ClientError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::PermissionDenied | MediaError::Unavailable(_) => {
                ClientError::Permission(err)
            }
            MediaError::Session(msg) => ClientError::Negotiation(msg),
        }
    }
}
