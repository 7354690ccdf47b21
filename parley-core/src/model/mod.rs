mod connection;
mod room;
mod session;
mod signaling;

pub use connection::ConnectionId;
pub use room::{RoomId, RoomIdError};
pub use session::{IceCandidate, SdpKind, SessionDescription};
pub use signaling::{IceServerConfig, InboundFrame, MessageKind, NegotiationMessage, RelayNotice, Role};
