mod media;
mod peer;
mod signaling;

pub use media::TrackKind;
pub use peer::{Participant, PeerId};
pub use signaling::{Envelope, IceCandidate, IceServerConfig, SignalMessage};
