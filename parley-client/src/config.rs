use crate::ClientError;
use parley_core::utils::{ROOM_QUERY_PARAM, default_ice_servers};
use parley_core::{IceServerConfig, RoomId};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Environment variable consulted when no relay address is given explicitly.
pub const RELAY_URL_ENV: &str = "PARLEY_RELAY_URL";

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_NEGOTIATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Websocket endpoint of the relay, without the room parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayAddress(Url);

impl RelayAddress {
    pub fn parse(raw: &str) -> Result<Self, ClientError> {
        let url = Url::parse(raw.trim())
            .map_err(|e| ClientError::Configuration(format!("invalid relay url '{}': {}", raw, e)))?;

        match url.scheme() {
            "ws" | "wss" => Ok(Self(url)),
            other => Err(ClientError::Configuration(format!(
                "relay url must use ws:// or wss://, got {}://",
                other
            ))),
        }
    }

    /// First non-blank source wins: `explicit`, then `env_value`.
    pub fn resolve_from(
        explicit: Option<&str>,
        env_value: Option<&str>,
    ) -> Result<Option<Self>, ClientError> {
        [explicit, env_value]
            .into_iter()
            .flatten()
            .find(|raw| !raw.trim().is_empty())
            .map(Self::parse)
            .transpose()
    }

    /// [`RelayAddress::resolve_from`] with the value of [`RELAY_URL_ENV`].
    pub fn resolve(explicit: Option<&str>) -> Result<Option<Self>, ClientError> {
        let env_value = std::env::var(RELAY_URL_ENV).ok();
        Self::resolve_from(explicit, env_value.as_deref())
    }

    /// The connection target for `room`; an existing `room` parameter is replaced.
    pub fn room_url(&self, room: &RoomId) -> Url {
        let mut url = self.0.clone();
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != ROOM_QUERY_PARAM)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair(ROOM_QUERY_PARAM, room.as_str());
        url
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

impl fmt::Display for RelayAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything a [`crate::NegotiationClient`] needs, fixed at construction.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub relay: Option<RelayAddress>,
    pub ice_servers: Vec<IceServerConfig>,
    pub connect_timeout: Duration,
    /// How long the relay may take to acknowledge the room join.
    pub join_timeout: Duration,
    /// How long an offer may wait for its answer.
    pub negotiation_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay: None,
            ice_servers: default_ice_servers(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            join_timeout: DEFAULT_JOIN_TIMEOUT,
            negotiation_timeout: DEFAULT_NEGOTIATION_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn with_relay(relay: RelayAddress) -> Self {
        Self {
            relay: Some(relay),
            ..Self::default()
        }
    }
}
