
pub use relay_helpers::*;
pub use test_peer::*;
