use tokio::sync::oneshot;

use crate::error::CallError;

/// Requests from a `CallHandle` to the controller's event loop.
#[derive(Debug)]
pub enum CallCommand {
    StartCall {
        reply: oneshot::Sender<Result<(), CallError>>,
    },

    EndCall { reply: oneshot::Sender<()> },

    /// Replies with the new enabled flag.
    ToggleVideo { reply: oneshot::Sender<bool> },

    /// Replies with the new enabled flag.
    ToggleAudio { reply: oneshot::Sender<bool> },
}
