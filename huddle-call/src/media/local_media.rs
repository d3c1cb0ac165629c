use async_trait::async_trait;

use crate::error::MediaAcquisitionError;
use crate::media::LocalStream;

/// Which kinds of track a call asks the capture device for.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
        }
    }
}

/// Local capture capability. Implementations hand out fresh tracks on every
/// call; the controller is the only one that stops or toggles them.
#[async_trait]
pub trait LocalMedia: Send + Sync {
    async fn acquire(
        &self,
        constraints: MediaConstraints,
    ) -> Result<LocalStream, MediaAcquisitionError>;
}
