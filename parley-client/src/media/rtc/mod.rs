//! [`MediaBackend`](crate::media::MediaBackend) on top of the `webrtc` crate.
//!
//! There is no device capture here: the local track is an Opus track fed
//! with silence frames while it is enabled.

mod session;
mod track;

pub use session::{RtcBackend, RtcSession};
pub use track::RtcAudioTrack;

use crate::MediaError;

fn session_err(e: webrtc::Error) -> MediaError {
    MediaError::Session(e.to_string())
}
