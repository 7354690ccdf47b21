use std::net::SocketAddr;

pub const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 3000);
pub const DEFAULT_WS_PATH: &str = "/ws";

/// Membership rules applied by every room.
#[derive(Debug, Clone)]
pub struct RoomPolicy {
    /// `None` lets any number of connections share a room.
    pub max_members: Option<usize>,
    /// Capacity of each room's command queue.
    pub command_buffer: usize,
}

impl Default for RoomPolicy {
    fn default() -> Self {
        Self {
            max_members: Some(2),
            command_buffer: 100,
        }
    }
}

impl RoomPolicy {
    pub fn unbounded() -> Self {
        Self {
            max_members: None,
            ..Self::default()
        }
    }

    pub fn with_max_members(max_members: usize) -> Self {
        Self {
            max_members: Some(max_members),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind: SocketAddr,
    /// Route the websocket endpoint is served on.
    pub path: String,
    pub policy: RoomPolicy,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(DEFAULT_BIND_ADDR),
            path: DEFAULT_WS_PATH.to_owned(),
            policy: RoomPolicy::default(),
        }
    }
}

impl RelayConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.path.starts_with('/') {
            anyhow::bail!("websocket path must start with '/': {}", self.path);
        }
        if self.path == "/health" {
            anyhow::bail!("websocket path collides with the health endpoint");
        }
        if self.policy.max_members == Some(0) {
            anyhow::bail!("max_members must be at least 1");
        }
        if self.policy.command_buffer == 0 {
            anyhow::bail!("command_buffer must be at least 1");
        }
        Ok(())
    }
}
