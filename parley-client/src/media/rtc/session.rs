use crate::MediaError;
use crate::media::rtc::{RtcAudioTrack, session_err};
use crate::media::{MediaBackend, MediaSession, RemoteAudio, SessionEvent, SessionEvents};
use async_trait::async_trait;
use parley_core::{IceCandidate, IceServerConfig, SdpKind, SessionDescription};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::{API, APIBuilder};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

/// Builds peer connections with the default codecs and interceptors.
pub struct RtcBackend {
    api: API,
}

impl RtcBackend {
    pub fn new() -> Result<Self, MediaError> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs().map_err(session_err)?;

        let registry =
            register_default_interceptors(Registry::new(), &mut media_engine).map_err(session_err)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        Ok(Self { api })
    }
}

#[async_trait]
impl MediaBackend for RtcBackend {
    type Track = RtcAudioTrack;
    type Session = RtcSession;

    async fn capture_audio(&self) -> Result<RtcAudioTrack, MediaError> {
        let stream_id = format!("parley-{}", Uuid::new_v4());
        Ok(RtcAudioTrack::new(&stream_id))
    }

    async fn open_session(
        &self,
        ice_servers: &[IceServerConfig],
        events: SessionEvents,
    ) -> Result<RtcSession, MediaError> {
        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            self.api
                .new_peer_connection(rtc_config)
                .await
                .map_err(session_err)?,
        );

        let state_events = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let events = state_events.clone();
                Box::pin(async move {
                    info!("Peer connection state changed: {}", s);
                    if s == RTCPeerConnectionState::Failed {
                        events.emit(SessionEvent::ConnectionLost(format!(
                            "peer connection {}",
                            s
                        )));
                    }
                })
            },
        ));

        let ice_events = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let events = ice_events.clone();
            Box::pin(async move {
                let Some(candidate) = c else { return };
                match candidate.to_json() {
                    Ok(init) => {
                        events.emit(SessionEvent::LocalCandidate(from_rtc_candidate(init)));
                    }
                    Err(e) => warn!("Failed to serialize local candidate: {}", e),
                }
            })
        }));

        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let events = events.clone();
                Box::pin(async move {
                    let remote = RemoteAudio {
                        track_id: track.id(),
                        stream_id: track.stream_id(),
                        codec: track.codec().capability.mime_type,
                    };
                    info!("Remote track {} ({}) arrived", remote.track_id, remote.codec);
                    events.emit(SessionEvent::RemoteTrack(remote));

                    // Keep the receiver flowing; playback is left to the embedding application.
                    tokio::spawn(async move {
                        let mut packets: u64 = 0;
                        while track.read_rtp().await.is_ok() {
                            packets += 1;
                        }
                        debug!("Remote track {} ended after {} packets", track.id(), packets);
                    });
                })
            },
        ));

        Ok(RtcSession { peer_connection })
    }
}

pub struct RtcSession {
    peer_connection: Arc<RTCPeerConnection>,
}

#[async_trait]
impl MediaSession for RtcSession {
    type Track = RtcAudioTrack;

    async fn add_track(&self, track: &RtcAudioTrack) -> Result<(), MediaError> {
        let local: Arc<dyn TrackLocal + Send + Sync> = track.local();
        let rtp_sender = self
            .peer_connection
            .add_track(local)
            .await
            .map_err(session_err)?;

        // RTCP has to be read for the interceptors to do their work.
        tokio::spawn(async move {
            let mut buf = vec![0u8; 1500];
            while rtp_sender.read(&mut buf).await.is_ok() {
                trace!("RTCP packet read");
            }
        });
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription, MediaError> {
        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .map_err(session_err)?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription, MediaError> {
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .map_err(session_err)?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), MediaError> {
        self.peer_connection
            .set_local_description(to_rtc_description(desc)?)
            .await
            .map_err(session_err)
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), MediaError> {
        self.peer_connection
            .set_remote_description(to_rtc_description(desc)?)
            .await
            .map_err(session_err)
    }

    async fn add_candidate(&self, candidate: IceCandidate) -> Result<(), MediaError> {
        self.peer_connection
            .add_ice_candidate(to_rtc_candidate(candidate))
            .await
            .map_err(session_err)
    }

    async fn close(&self) -> Result<(), MediaError> {
        self.peer_connection.close().await.map_err(session_err)
    }
}

fn to_rtc_description(desc: SessionDescription) -> Result<RTCSessionDescription, MediaError> {
    match desc.kind {
        SdpKind::Offer => RTCSessionDescription::offer(desc.sdp),
        SdpKind::Answer => RTCSessionDescription::answer(desc.sdp),
        SdpKind::Pranswer => RTCSessionDescription::pranswer(desc.sdp),
        SdpKind::Rollback => {
            return Err(MediaError::Session(
                "rollback descriptions are not supported".to_owned(),
            ));
        }
    }
    .map_err(session_err)
}

fn to_rtc_candidate(candidate: IceCandidate) -> RTCIceCandidateInit {
    RTCIceCandidateInit {
        candidate: candidate.candidate,
        sdp_mid: candidate.sdp_mid,
        sdp_mline_index: candidate.sdp_m_line_index,
        username_fragment: candidate.username_fragment,
    }
}

fn from_rtc_candidate(init: RTCIceCandidateInit) -> IceCandidate {
    IceCandidate {
        candidate: init.candidate,
        sdp_mid: init.sdp_mid,
        sdp_m_line_index: init.sdp_mline_index,
        username_fragment: init.username_fragment,
    }
}
