pub mod call;
pub mod error;
pub mod media;
pub mod peer;
pub mod signaling;
pub mod transport;

pub use call::*;
pub use error::*;
pub use media::*;
pub use peer::*;
pub use signaling::*;
pub use transport::*;
