mod envelope;
mod relay_state;
mod ws_handler;

pub use envelope::*;
pub use relay_state::*;
pub use ws_handler::*;
