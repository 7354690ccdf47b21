use crate::model::session::{IceCandidate, SessionDescription};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

/// Messages one client sends to its peer through the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NegotiationMessage {
    Offer { sdp: SessionDescription },
    Answer { sdp: SessionDescription },
    Candidate { candidate: IceCandidate },
    Leave,
}

impl NegotiationMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            NegotiationMessage::Offer { .. } => MessageKind::Offer,
            NegotiationMessage::Answer { .. } => MessageKind::Answer,
            NegotiationMessage::Candidate { .. } => MessageKind::Candidate,
            NegotiationMessage::Leave => MessageKind::Leave,
        }
    }
}

/// The `type` tag of a negotiation message, without its payload.
///
/// The relay reads only this field of each frame: parsing a frame into
/// [`MessageKind`] ignores every other key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Offer,
    Answer,
    Candidate,
    Leave,
}

/// Which side of the offer/answer exchange a member plays.
///
/// The relay hands out `Initiator` to the first member of a room and
/// `Responder` to everyone joining after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Initiator,
    Responder,
}

/// Frames generated by the relay itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RelayNotice {
    /// Sent once, right after the connection is registered in its room.
    Joined { role: Role, peers: usize },
    /// Sent to existing members when another connection joins.
    PeerJoined,
    /// Sent before the relay closes a connection that exceeds room capacity.
    RoomFull { capacity: usize },
}

/// Anything a client can receive on its relay connection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum InboundFrame {
    Negotiation(NegotiationMessage),
    Notice(RelayNotice),
}
