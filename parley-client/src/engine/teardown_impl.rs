use crate::ClientError;
use crate::engine::{CallState, NegotiationClient};
use crate::media::MediaBackend;
use parley_core::NegotiationMessage;
use tracing::{info, warn};

/// Why a call is ending.
pub(super) enum Ending {
    /// The local user hung up.
    HangUp,
    /// The peer sent `leave`.
    PeerLeft,
    /// The relay connection dropped.
    RelayLost,
    /// The media layer reported the peer connection failed.
    ConnectionLost(String),
    RoomFull { capacity: usize },
    /// The relay never acknowledged the join.
    JoinTimedOut,
    /// Our offer was never answered.
    NoAnswer,
    Failed(ClientError),
    /// Every client handle was dropped.
    Shutdown,
}

impl Ending {
    fn sends_leave(&self) -> bool {
        matches!(
            self,
            Ending::HangUp
                | Ending::ConnectionLost(_)
                | Ending::NoAnswer
                | Ending::Failed(_)
                | Ending::Shutdown
        )
    }

    fn transitional_state(&self) -> CallState {
        match self {
            Ending::HangUp | Ending::Shutdown => CallState::Leaving,
            _ => CallState::Disconnected,
        }
    }

    fn status(&self) -> String {
        match self {
            Ending::HangUp => "disconnected".to_owned(),
            Ending::PeerLeft => "peer left".to_owned(),
            Ending::RelayLost => "connection to relay lost".to_owned(),
            Ending::ConnectionLost(reason) => format!("connection lost ({})", reason),
            Ending::RoomFull { capacity } => {
                ClientError::RoomFull { capacity: *capacity }.to_string()
            }
            Ending::JoinTimedOut => "relay did not acknowledge the join".to_owned(),
            Ending::NoAnswer => "peer did not answer".to_owned(),
            Ending::Failed(e) => e.to_string(),
            Ending::Shutdown => "client shut down".to_owned(),
        }
    }

    /// What a still-pending `join` resolves to.
    fn join_error(self) -> ClientError {
        match self {
            Ending::HangUp => ClientError::Cancelled,
            Ending::Shutdown => ClientError::Closed,
            Ending::RoomFull { capacity } => ClientError::RoomFull { capacity },
            Ending::Failed(e) => e,
            other => ClientError::Transport(other.status()),
        }
    }
}

impl<B: MediaBackend> NegotiationClient<B> {
    pub(super) async fn handle_leave(&mut self) {
        if self.call.is_none() {
            info!("Leave ignored: no active call");
            return;
        }
        self.end_call(Ending::HangUp).await;
    }

    pub(super) async fn handle_relay_closed(&mut self) {
        warn!("Relay connection closed");
        self.end_call(Ending::RelayLost).await;
    }

    pub(super) async fn shutdown(&mut self) {
        if self.call.is_some() {
            self.end_call(Ending::Shutdown).await;
        }
    }

    /// Tear the current call down and return to idle. Every exit path of a
    /// call ends here, so the session, track and relay connection are
    /// released exactly once.
    pub(super) async fn end_call(&mut self, ending: Ending) {
        let Some(mut call) = self.call.take() else {
            return;
        };

        self.report.set_state(ending.transitional_state());

        if ending.sends_leave() && call.is_joined() {
            if let Err(e) = call.relay.send(&NegotiationMessage::Leave) {
                warn!("Could not send leave: {}", e);
            }
        }

        let status = ending.status();
        info!("Ending call in '{}': {}", call.room, status);
        call.resolve_join(Err(ending.join_error()));
        call.release().await;

        self.report.status(status);
        self.report.set_state(CallState::Idle);
    }
}
