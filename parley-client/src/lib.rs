mod config;
mod engine;
mod error;
pub mod media;
mod transport;

pub use config::*;
pub use engine::{CallState, ClientEvent, ClientHandle, NegotiationClient};
pub use error::*;
pub use transport::RelayConnection;
pub use media::rtc::RtcBackend;
