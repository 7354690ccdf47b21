use crate::ClientError;
use crate::engine::teardown_impl::Ending;
use crate::engine::{CallState, NegotiationClient};
use crate::media::MediaBackend;
use parley_core::{InboundFrame, NegotiationMessage, RelayNotice, Role, SessionDescription};
use tokio::time::Instant;
use tracing::{debug, info, warn};

impl<B: MediaBackend> NegotiationClient<B> {
    pub(super) async fn handle_frame(&mut self, frame: InboundFrame) {
        match frame {
            InboundFrame::Notice(notice) => self.handle_notice(notice).await,
            InboundFrame::Negotiation(msg) => self.handle_signal(msg).await,
        }
    }

    async fn handle_notice(&mut self, notice: RelayNotice) {
        match notice {
            RelayNotice::Joined { role, peers } => self.on_joined(role, peers).await,

            RelayNotice::PeerJoined => {
                match self.report.state() {
                    CallState::Joined => {
                        if let Some(call) = self.call.as_mut() {
                            if call.role == Some(Role::Responder) {
                                info!("Previous peer is gone; taking over as initiator");
                                call.role = Some(Role::Initiator);
                            }
                        }
                    }
                    // A two-member room only admits a newcomer once the old
                    // peer's connection is gone, even if it never sent `leave`.
                    CallState::Offering | CallState::Answering | CallState::Connected => {
                        if let Err(e) = self.restart_negotiation().await {
                            self.end_call(Ending::Failed(e)).await;
                            return;
                        }
                    }
                    state => {
                        debug!("Peer joined while {:?}; not offering", state);
                        return;
                    }
                }
                if let Err(e) = self.send_offer().await {
                    self.end_call(Ending::Failed(e)).await;
                }
            }

            RelayNotice::RoomFull { capacity } => {
                self.end_call(Ending::RoomFull { capacity }).await;
            }
        }
    }

    async fn handle_signal(&mut self, msg: NegotiationMessage) {
        let state = self.report.state();
        match msg {
            NegotiationMessage::Offer { sdp } => match state {
                CallState::Joined => {
                    if let Err(e) = self.answer_offer(sdp).await {
                        self.end_call(Ending::Failed(e)).await;
                    }
                }
                CallState::Offering => {
                    warn!("Ignoring offer received while our own offer is outstanding");
                }
                _ => warn!("Ignoring offer received while {:?}", state),
            },

            NegotiationMessage::Answer { sdp } => {
                if state != CallState::Offering {
                    warn!("Ignoring answer received while {:?}", state);
                    return;
                }
                if let Err(e) = self.accept_answer(sdp).await {
                    self.end_call(Ending::Failed(e)).await;
                }
            }

            NegotiationMessage::Candidate { candidate } => match self.call.as_mut() {
                Some(call) => call.add_remote_candidate(candidate).await,
                None => debug!("Dropping candidate: no active call"),
            },

            NegotiationMessage::Leave => {
                info!("Peer sent leave");
                self.end_call(Ending::PeerLeft).await;
            }
        }
    }

    async fn send_offer(&mut self) -> Result<(), ClientError> {
        let Some(call) = self.call.as_mut() else {
            return Ok(());
        };
        if call.local_description.is_some() {
            warn!("Already offered in this call; not offering again");
            return Ok(());
        }
        self.report.set_state(CallState::Offering);
        self.report.status("calling peer");

        let offer = call.create_offer().await?;
        call.send_description(NegotiationMessage::Offer { sdp: offer })?;
        call.deadline = Some(Instant::now() + self.config.negotiation_timeout);
        Ok(())
    }

    async fn answer_offer(&mut self, offer: SessionDescription) -> Result<(), ClientError> {
        let Some(call) = self.call.as_mut() else {
            return Ok(());
        };
        self.report.set_state(CallState::Answering);
        self.report.status("answering peer");

        call.apply_remote_description(offer).await?;
        let answer = call.create_answer().await?;
        call.send_description(NegotiationMessage::Answer { sdp: answer })?;

        self.report.set_state(CallState::Connected);
        self.report.status("connected");
        Ok(())
    }

    async fn accept_answer(&mut self, answer: SessionDescription) -> Result<(), ClientError> {
        let Some(call) = self.call.as_mut() else {
            return Ok(());
        };
        call.apply_remote_description(answer).await?;
        call.deadline = None;

        self.report.set_state(CallState::Connected);
        self.report.status("connected");
        Ok(())
    }
}
