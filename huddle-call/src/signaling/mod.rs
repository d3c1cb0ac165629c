mod local_relay;
mod signaling_channel;

pub use local_relay::*;
pub use signaling_channel::*;
