mod peer_manager;
mod session;

pub use peer_manager::*;
pub use session::*;
