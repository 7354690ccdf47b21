use crate::engine::teardown_impl::Ending;
use crate::engine::{CallState, ClientEvent, NegotiationClient};
use crate::media::{MediaBackend, SessionEvent};
use tracing::{debug, warn};

impl<B: MediaBackend> NegotiationClient<B> {
    pub(super) async fn handle_session_event(&mut self, call_id: u64, event: SessionEvent) {
        let Some(call) = self.call.as_mut().filter(|call| call.id == call_id) else {
            debug!("Dropping {:?} from finished call {}", event, call_id);
            return;
        };

        match event {
            SessionEvent::LocalCandidate(candidate) => {
                if let Err(e) = call.add_local_candidate(candidate) {
                    warn!("Could not send local candidate: {}", e);
                }
            }

            SessionEvent::RemoteTrack(remote) => {
                call.remote_tracks.push(remote.clone());
                self.report.event(ClientEvent::RemoteAudio(remote));
            }

            SessionEvent::ConnectionLost(reason) => {
                self.end_call(Ending::ConnectionLost(reason)).await;
            }
        }
    }

    pub(super) async fn handle_deadline(&mut self) {
        match self.report.state() {
            CallState::Connecting => self.end_call(Ending::JoinTimedOut).await,
            CallState::Offering => self.end_call(Ending::NoAnswer).await,
            state => {
                debug!("Deadline passed while {:?}; clearing it", state);
                if let Some(call) = self.call.as_mut() {
                    call.deadline = None;
                }
            }
        }
    }
}
