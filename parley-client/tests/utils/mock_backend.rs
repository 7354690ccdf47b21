use async_trait::async_trait;
use parley_client::MediaError;
use parley_client::media::{
    LocalAudio, MediaBackend, MediaSession, RemoteAudio, SessionEvent, SessionEvents,
};
use parley_core::{IceCandidate, IceServerConfig, SdpKind, SessionDescription};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct MockState {
    deny_capture: AtomicBool,
    captures: AtomicUsize,
    live_tracks: AtomicUsize,
    opened_sessions: AtomicUsize,
    closed_sessions: AtomicUsize,
    applied_candidates: Mutex<Vec<IceCandidate>>,
    rejected_candidates: AtomicUsize,
    last_track_enabled: Mutex<Option<bool>>,
    session_events: Mutex<Vec<SessionEvents>>,
}

/// In-memory media layer. Sessions produce recognisable fake descriptions,
/// emit one local candidate once their local description is set, and
/// announce a remote track once the remote description is applied.
#[derive(Clone, Default)]
pub struct MockBackend {
    label: String,
    state: Arc<MockState>,
}

impl MockBackend {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_owned(),
            state: Arc::default(),
        }
    }

    /// Make the next captures fail as if the user refused the microphone.
    pub fn deny_microphone(&self) {
        self.state.deny_capture.store(true, Ordering::SeqCst);
    }

    pub fn captures(&self) -> usize {
        self.state.captures.load(Ordering::SeqCst)
    }

    pub fn live_tracks(&self) -> usize {
        self.state.live_tracks.load(Ordering::SeqCst)
    }

    pub fn opened_sessions(&self) -> usize {
        self.state.opened_sessions.load(Ordering::SeqCst)
    }

    pub fn closed_sessions(&self) -> usize {
        self.state.closed_sessions.load(Ordering::SeqCst)
    }

    pub fn applied_candidates(&self) -> Vec<IceCandidate> {
        self.state.applied_candidates.lock().unwrap().clone()
    }

    pub fn rejected_candidates(&self) -> usize {
        self.state.rejected_candidates.load(Ordering::SeqCst)
    }

    pub fn track_enabled(&self) -> Option<bool> {
        *self.state.last_track_enabled.lock().unwrap()
    }

    /// Report a failed peer connection on every session opened so far.
    pub fn fail_connection(&self) {
        for events in self.state.session_events.lock().unwrap().iter() {
            events.emit(SessionEvent::ConnectionLost("ice failed".to_owned()));
        }
    }
}

pub struct MockTrack {
    id: String,
    enabled: AtomicBool,
    stopped: AtomicBool,
    state: Arc<MockState>,
}

impl LocalAudio for MockTrack {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        *self.state.last_track_enabled.lock().unwrap() = Some(enabled);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            self.state.live_tracks.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

pub struct MockSession {
    label: String,
    events: SessionEvents,
    remote_set: AtomicBool,
    closed: AtomicBool,
    state: Arc<MockState>,
}

#[async_trait]
impl MediaSession for MockSession {
    type Track = MockTrack;

    async fn add_track(&self, _track: &MockTrack) -> Result<(), MediaError> {
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription, MediaError> {
        Ok(SessionDescription::offer(format!("v=0 offer from {}", self.label)))
    }

    async fn create_answer(&self) -> Result<SessionDescription, MediaError> {
        if !self.remote_set.load(Ordering::SeqCst) {
            return Err(MediaError::Session("no remote offer".to_owned()));
        }
        Ok(SessionDescription::answer(format!("v=0 answer from {}", self.label)))
    }

    async fn set_local_description(&self, _desc: SessionDescription) -> Result<(), MediaError> {
        self.events.emit(SessionEvent::LocalCandidate(IceCandidate {
            candidate: format!("candidate:{} 1 udp 1 127.0.0.1 9 typ host", self.label),
            sdp_mid: Some("0".to_owned()),
            sdp_m_line_index: Some(0),
            username_fragment: None,
        }));
        Ok(())
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), MediaError> {
        if !matches!(desc.kind, SdpKind::Offer | SdpKind::Answer) {
            return Err(MediaError::Session("unexpected description".to_owned()));
        }
        self.remote_set.store(true, Ordering::SeqCst);
        self.events.emit(SessionEvent::RemoteTrack(RemoteAudio {
            track_id: "remote-audio".to_owned(),
            stream_id: desc.sdp,
            codec: "audio/opus".to_owned(),
        }));
        Ok(())
    }

    async fn add_candidate(&self, candidate: IceCandidate) -> Result<(), MediaError> {
        if !self.remote_set.load(Ordering::SeqCst) {
            self.state.rejected_candidates.fetch_add(1, Ordering::SeqCst);
            return Err(MediaError::Session("remote description not set".to_owned()));
        }
        self.state.applied_candidates.lock().unwrap().push(candidate);
        Ok(())
    }

    async fn close(&self) -> Result<(), MediaError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.state.closed_sessions.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

#[async_trait]
impl MediaBackend for MockBackend {
    type Track = MockTrack;
    type Session = MockSession;

    async fn capture_audio(&self) -> Result<MockTrack, MediaError> {
        if self.state.deny_capture.load(Ordering::SeqCst) {
            return Err(MediaError::PermissionDenied);
        }
        let n = self.state.captures.fetch_add(1, Ordering::SeqCst);
        self.state.live_tracks.fetch_add(1, Ordering::SeqCst);
        Ok(MockTrack {
            id: format!("{}-mic-{}", self.label, n),
            enabled: AtomicBool::new(true),
            stopped: AtomicBool::new(false),
            state: self.state.clone(),
        })
    }

    async fn open_session(
        &self,
        _ice_servers: &[IceServerConfig],
        events: SessionEvents,
    ) -> Result<MockSession, MediaError> {
        self.state.opened_sessions.fetch_add(1, Ordering::SeqCst);
        self.state.session_events.lock().unwrap().push(events.clone());
        Ok(MockSession {
            label: self.label.clone(),
            events,
            remote_set: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            state: self.state.clone(),
        })
    }
}
