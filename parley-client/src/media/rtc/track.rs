use crate::media::LocalAudio;
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use webrtc::api::media_engine::MIME_TYPE_OPUS;
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

const FRAME_DURATION: Duration = Duration::from_millis(20);

/// One 20 ms Opus frame of silence (TOC byte for CELT fullband, then padding).
const OPUS_SILENCE: [u8; 3] = [0xf8, 0xff, 0xfe];

pub struct RtcAudioTrack {
    track: Arc<TrackLocalStaticSample>,
    enabled: Arc<AtomicBool>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl RtcAudioTrack {
    /// Must be called inside a tokio runtime; the frame pump starts immediately.
    pub fn new(stream_id: &str) -> Self {
        let track = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: 48000,
                channels: 2,
                sdp_fmtp_line: "minptime=10;useinbandfec=1".to_owned(),
                rtcp_feedback: vec![],
            },
            "audio".to_owned(),
            stream_id.to_owned(),
        ));
        let enabled = Arc::new(AtomicBool::new(true));

        let pump = tokio::spawn(pump_silence(track.clone(), enabled.clone()));

        Self {
            track,
            enabled,
            pump: Mutex::new(Some(pump)),
        }
    }

    pub fn local(&self) -> Arc<TrackLocalStaticSample> {
        self.track.clone()
    }

    pub fn is_live(&self) -> bool {
        self.pump
            .lock()
            .map(|pump| pump.is_some())
            .unwrap_or(false)
    }
}

async fn pump_silence(track: Arc<TrackLocalStaticSample>, enabled: Arc<AtomicBool>) {
    let mut ticker = tokio::time::interval(FRAME_DURATION);
    loop {
        ticker.tick().await;
        if !enabled.load(Ordering::Relaxed) {
            continue;
        }
        let sample = Sample {
            data: Bytes::from_static(&OPUS_SILENCE),
            duration: FRAME_DURATION,
            ..Default::default()
        };
        if let Err(e) = track.write_sample(&sample).await {
            warn!("Failed to write audio frame: {}", e);
        }
    }
}

impl LocalAudio for RtcAudioTrack {
    fn id(&self) -> String {
        self.track.id().to_owned()
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    fn stop(&self) {
        let pump = match self.pump.lock() {
            Ok(mut pump) => pump.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(pump) = pump {
            pump.abort();
            debug!("Local audio track {} stopped", self.track.id());
        }
    }
}

impl Drop for RtcAudioTrack {
    fn drop(&mut self) {
        self.stop();
    }
}
