pub use parley_core::model::{NegotiationMessage, RoomId};

pub mod model {
    pub use parley_core::model::*;
}

#[cfg(feature = "relay")]
pub mod relay {
    pub use parley_relay::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use parley_client::*;
}
