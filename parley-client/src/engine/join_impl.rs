use crate::engine::{CallSession, CallState, NegotiationClient};
use crate::engine::teardown_impl::Ending;
use crate::media::{LocalAudio, MediaBackend, MediaSession, SessionEvents};
use crate::{ClientError, MediaError, RelayConnection};
use parley_core::{IceServerConfig, Role, RoomId};
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{info, warn};

impl<B: MediaBackend> NegotiationClient<B> {
    pub(super) async fn handle_join(
        &mut self,
        room: String,
        reply: oneshot::Sender<Result<(), ClientError>>,
    ) {
        if self.call.is_some() {
            warn!("Join for '{}' refused: a call is already in progress", room);
            let _ = reply.send(Err(ClientError::Busy));
            return;
        }

        match self.start_call(&room).await {
            Ok((room, relay, track)) => {
                self.next_call_id += 1;
                let deadline = Instant::now() + self.config.join_timeout;
                self.report
                    .status(format!("connected to relay, joining room '{}'", room));
                self.call = Some(CallSession::new(
                    self.next_call_id,
                    room,
                    relay,
                    track,
                    deadline,
                    reply,
                ));
            }
            Err(e) => {
                self.report.status(e.to_string());
                self.report.set_state(CallState::Idle);
                let _ = reply.send(Err(e));
            }
        }
    }

    /// Setup steps that can fail, in order: room id, relay address, microphone,
    /// relay connection. A failing step releases whatever the earlier ones took.
    async fn start_call(
        &mut self,
        raw_room: &str,
    ) -> Result<(RoomId, RelayConnection, B::Track), ClientError> {
        let room = RoomId::parse(raw_room)?;
        let relay = self.config.relay.clone().ok_or_else(|| {
            ClientError::Configuration("no relay address configured".to_owned())
        })?;

        self.report.status("requesting microphone");
        let track = self
            .backend
            .capture_audio()
            .await
            .map_err(ClientError::Permission)?;

        self.report.set_state(CallState::Connecting);
        self.report.status(format!("connecting to {}", relay));

        let url = relay.room_url(&room);
        match RelayConnection::connect(&url, self.config.connect_timeout).await {
            Ok(connection) => Ok((room, connection, track)),
            Err(e) => {
                track.stop();
                Err(e)
            }
        }
    }

    /// The relay registered us: open the media session and attach the track.
    pub(super) async fn on_joined(&mut self, role: Role, peers: usize) {
        if self.report.state() != CallState::Connecting {
            warn!("Ignoring duplicate join acknowledgement");
            return;
        }
        let Some(call) = self.call.as_mut() else {
            return;
        };

        let events = SessionEvents::new(call.id, self.session_tx.clone());
        let opened =
            open_media(&self.backend, &self.config.ice_servers, events, &call.track).await;

        let session = match opened {
            Ok(session) => session,
            Err(e) => {
                self.end_call(Ending::Failed(e.into())).await;
                return;
            }
        };

        info!(
            "Joined room '{}' as {:?} with {} peer(s), sending track {}",
            call.room,
            role,
            peers,
            call.track.id()
        );
        call.session = Some(session);
        call.role = Some(role);
        call.deadline = None;

        self.report.set_state(CallState::Joined);
        match role {
            Role::Initiator => self.report.status("joined, waiting for a peer"),
            Role::Responder => self.report.status("joined, waiting for the peer's offer"),
        }
        call.resolve_join(Ok(()));
    }

    /// A new peer joined while we were negotiating with, or talking to, an
    /// earlier one. That peer is gone: renegotiate on a fresh media session
    /// over the same relay connection and local track.
    pub(super) async fn restart_negotiation(&mut self) -> Result<(), ClientError> {
        let Some(call) = self.call.as_mut() else {
            return Ok(());
        };
        self.next_call_id += 1;
        info!(
            "Restarting negotiation in '{}' (call {} -> {})",
            call.room, call.id, self.next_call_id
        );
        call.reset_negotiation(self.next_call_id).await;

        let events = SessionEvents::new(call.id, self.session_tx.clone());
        let session =
            open_media(&self.backend, &self.config.ice_servers, events, &call.track).await?;
        call.session = Some(session);
        call.role = Some(Role::Initiator);

        self.report.set_state(CallState::Joined);
        self.report.status("peer rejoined, renegotiating");
        Ok(())
    }
}

/// Open a media session and attach the local track to it.
async fn open_media<B: MediaBackend>(
    backend: &B,
    ice_servers: &[IceServerConfig],
    events: SessionEvents,
    track: &B::Track,
) -> Result<B::Session, MediaError> {
    let session = backend.open_session(ice_servers, events).await?;
    if let Err(e) = session.add_track(track).await {
        let _ = session.close().await;
        return Err(e);
    }
    Ok(session)
}
