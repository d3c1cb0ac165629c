mod local_media;
mod local_stream;
mod remote_stream;
mod synthetic;

pub use local_media::*;
pub use local_stream::*;
pub use remote_stream::*;
pub use synthetic::*;
