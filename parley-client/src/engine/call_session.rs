use crate::ClientError;
use crate::RelayConnection;
use crate::media::{LocalAudio, MediaBackend, MediaSession, RemoteAudio};
use parley_core::{IceCandidate, NegotiationMessage, Role, RoomId, SessionDescription};
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Remote candidates held while no remote description is set. Past this the
/// oldest are dropped.
const MAX_PENDING_REMOTE_CANDIDATES: usize = 64;

/// Everything one call holds. Dropped as a unit when the call ends.
pub(super) struct CallSession<B: MediaBackend> {
    pub(super) id: u64,
    pub(super) room: RoomId,
    pub(super) relay: RelayConnection,
    pub(super) track: B::Track,
    /// Opened once the relay acknowledges the join.
    pub(super) session: Option<B::Session>,
    pub(super) role: Option<Role>,
    pub(super) pending_join: Option<oneshot::Sender<Result<(), ClientError>>>,
    /// Join acknowledgement or answer deadline, whichever is being awaited.
    pub(super) deadline: Option<Instant>,
    pub(super) local_description: Option<SessionDescription>,
    pub(super) remote_description: Option<SessionDescription>,
    pub(super) remote_tracks: Vec<RemoteAudio>,
    pending_local_candidates: Vec<IceCandidate>,
    pending_remote_candidates: Vec<IceCandidate>,
    description_sent: bool,
}

impl<B: MediaBackend> CallSession<B> {
    pub(super) fn new(
        id: u64,
        room: RoomId,
        relay: RelayConnection,
        track: B::Track,
        join_deadline: Instant,
        pending_join: oneshot::Sender<Result<(), ClientError>>,
    ) -> Self {
        Self {
            id,
            room,
            relay,
            track,
            session: None,
            role: None,
            pending_join: Some(pending_join),
            deadline: Some(join_deadline),
            local_description: None,
            remote_description: None,
            remote_tracks: Vec::new(),
            pending_local_candidates: Vec::new(),
            pending_remote_candidates: Vec::new(),
            description_sent: false,
        }
    }

    /// True once the relay acknowledged the join.
    pub(super) fn is_joined(&self) -> bool {
        self.role.is_some()
    }

    pub(super) fn set_muted(&self, muted: bool) {
        self.track.set_enabled(!muted);
    }

    pub(super) fn resolve_join(&mut self, result: Result<(), ClientError>) {
        if let Some(reply) = self.pending_join.take() {
            let _ = reply.send(result);
        }
    }

    fn media(&self) -> Result<&B::Session, ClientError> {
        self.session
            .as_ref()
            .ok_or_else(|| ClientError::Negotiation("no media session".to_owned()))
    }

    pub(super) async fn create_offer(&mut self) -> Result<SessionDescription, ClientError> {
        let session = self.media()?;
        let offer = session.create_offer().await?;
        session.set_local_description(offer.clone()).await?;
        self.local_description = Some(offer.clone());
        Ok(offer)
    }

    pub(super) async fn create_answer(&mut self) -> Result<SessionDescription, ClientError> {
        let session = self.media()?;
        let answer = session.create_answer().await?;
        session.set_local_description(answer.clone()).await?;
        self.local_description = Some(answer.clone());
        Ok(answer)
    }

    /// Apply the peer's description, then every candidate that arrived ahead of it.
    pub(super) async fn apply_remote_description(
        &mut self,
        desc: SessionDescription,
    ) -> Result<(), ClientError> {
        let session = self.media()?;
        session.set_remote_description(desc.clone()).await?;
        self.remote_description = Some(desc);

        let queued = std::mem::take(&mut self.pending_remote_candidates);
        if !queued.is_empty() {
            debug!("Applying {} queued remote candidate(s)", queued.len());
        }
        for candidate in queued {
            self.apply_candidate(candidate).await;
        }
        Ok(())
    }

    pub(super) async fn add_remote_candidate(&mut self, candidate: IceCandidate) {
        if self.session.is_none() || self.remote_description.is_none() {
            if self.pending_remote_candidates.len() >= MAX_PENDING_REMOTE_CANDIDATES {
                warn!(
                    "More than {} remote candidates queued; dropping the oldest",
                    MAX_PENDING_REMOTE_CANDIDATES
                );
                self.pending_remote_candidates.remove(0);
            }
            debug!("Queueing remote candidate until the remote description is set");
            self.pending_remote_candidates.push(candidate);
            return;
        }
        self.apply_candidate(candidate).await;
    }

    async fn apply_candidate(&self, candidate: IceCandidate) {
        let Some(session) = &self.session else {
            return;
        };
        if let Err(e) = session.add_candidate(candidate).await {
            debug!("Ignoring remote candidate that failed to apply: {}", e);
        }
    }

    /// Send an offer or answer, then flush the local candidates held back for it.
    pub(super) fn send_description(&mut self, msg: NegotiationMessage) -> Result<(), ClientError> {
        self.relay.send(&msg)?;
        self.description_sent = true;

        for candidate in std::mem::take(&mut self.pending_local_candidates) {
            self.relay.send(&NegotiationMessage::Candidate { candidate })?;
        }
        Ok(())
    }

    pub(super) fn add_local_candidate(&mut self, candidate: IceCandidate) -> Result<(), ClientError> {
        if !self.description_sent {
            self.pending_local_candidates.push(candidate);
            return Ok(());
        }
        self.relay.send(&NegotiationMessage::Candidate { candidate })
    }

    /// Close the media session and forget everything negotiated with the
    /// previous peer. The relay connection and local track are kept.
    pub(super) async fn reset_negotiation(&mut self, id: u64) {
        if let Some(session) = self.session.take() {
            if let Err(e) = session.close().await {
                warn!("Failed to close media session: {}", e);
            }
        }
        self.id = id;
        self.deadline = None;
        self.local_description = None;
        self.remote_description = None;
        self.remote_tracks.clear();
        self.pending_local_candidates.clear();
        self.pending_remote_candidates.clear();
        self.description_sent = false;
    }

    /// Close the session, stop the track and close the relay connection.
    pub(super) async fn release(self) {
        if let Some(session) = &self.session {
            if let Err(e) = session.close().await {
                warn!("Failed to close media session: {}", e);
            }
        }
        self.track.stop();
        self.relay.close().await;
        debug!(
            "Call {} in '{}' released ({} remote track(s))",
            self.id,
            self.room,
            self.remote_tracks.len()
        );
    }
}
