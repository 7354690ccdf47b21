use crate::model::IceServerConfig;

pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:global.stun.twilio.com:3478";

/// Query parameter carrying the room id on the relay connection url.
pub const ROOM_QUERY_PARAM: &str = "room";

/// Upper bound on room id length, in characters.
pub const MAX_ROOM_ID_LEN: usize = 128;

pub fn default_ice_servers() -> Vec<IceServerConfig> {
    vec![
        IceServerConfig::stun(DEFAULT_STUN_ADDR),
        IceServerConfig::stun(DEFAULT_STUN_ADDR_2),
    ]
}
