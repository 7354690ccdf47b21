//! Contracts for the platform media layer the negotiation client drives.
//!
//! The client never looks inside session descriptions or candidates; it only
//! moves them between a [`MediaSession`] and the relay.

pub mod rtc;

use crate::MediaError;
use async_trait::async_trait;
use parley_core::{IceCandidate, IceServerConfig, SessionDescription};
use tokio::sync::mpsc;

/// A captured local audio track.
pub trait LocalAudio: Send + Sync + 'static {
    fn id(&self) -> String;

    /// Muting is `set_enabled(false)`; the track stays attached to the session.
    fn set_enabled(&self, enabled: bool);

    fn is_enabled(&self) -> bool;

    /// Release the capture device. Calling it again has no effect.
    fn stop(&self);
}

/// Inbound audio announced by the media session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAudio {
    pub track_id: String,
    pub stream_id: String,
    pub codec: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A local connectivity candidate was discovered.
    LocalCandidate(IceCandidate),
    RemoteTrack(RemoteAudio),
    /// The peer-to-peer path failed or was closed underneath the session.
    ConnectionLost(String),
}

/// Where a media session reports its events.
///
/// Every event is stamped with the call it belongs to, so events from a
/// session that has since been torn down are recognised and dropped.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    call_id: u64,
    tx: mpsc::UnboundedSender<(u64, SessionEvent)>,
}

impl SessionEvents {
    pub(crate) fn new(call_id: u64, tx: mpsc::UnboundedSender<(u64, SessionEvent)>) -> Self {
        Self { call_id, tx }
    }

    /// Returns `false` once the client is gone.
    pub fn emit(&self, event: SessionEvent) -> bool {
        self.tx.send((self.call_id, event)).is_ok()
    }
}

/// One peer-to-peer media session (a peer connection).
#[async_trait]
pub trait MediaSession: Send + Sync + 'static {
    type Track: LocalAudio;

    async fn add_track(&self, track: &Self::Track) -> Result<(), MediaError>;

    async fn create_offer(&self) -> Result<SessionDescription, MediaError>;

    async fn create_answer(&self) -> Result<SessionDescription, MediaError>;

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), MediaError>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), MediaError>;

    /// May legitimately fail once negotiation has moved on.
    async fn add_candidate(&self, candidate: IceCandidate) -> Result<(), MediaError>;

    async fn close(&self) -> Result<(), MediaError>;
}

/// Factory for local tracks and media sessions.
#[async_trait]
pub trait MediaBackend: Send + Sync + 'static {
    type Track: LocalAudio;
    type Session: MediaSession<Track = Self::Track>;

    /// Acquire an audio-only local track.
    async fn capture_audio(&self) -> Result<Self::Track, MediaError>;

    async fn open_session(
        &self,
        ice_servers: &[IceServerConfig],
        events: SessionEvents,
    ) -> Result<Self::Session, MediaError>;
}
