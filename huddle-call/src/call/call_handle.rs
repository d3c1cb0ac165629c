use huddle_core::Envelope;
use tokio::sync::{mpsc, oneshot, watch};

use crate::call::{CallCommand, CallController, CallSnapshot};
use crate::error::CallError;

const COMMAND_BUFFER: usize = 32;

/// Cloneable front end of a `CallController` running on its own task.
#[derive(Clone)]
pub struct CallHandle {
    commands: mpsc::Sender<CallCommand>,
    state_rx: watch::Receiver<CallSnapshot>,
}

impl CallHandle {
    /// Spawn the controller's loop. `inbound` is the relay's stream of frames
    /// for this participant.
    pub fn spawn(controller: CallController, inbound: mpsc::UnboundedReceiver<Envelope>) -> Self {
        let (commands, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let state_rx = controller.subscribe();

        tokio::spawn(controller.run(command_rx, inbound));

        Self { commands, state_rx }
    }

    pub async fn start_call(&self) -> Result<(), CallError> {
        self.request(|reply| CallCommand::StartCall { reply }).await?
    }

    pub async fn end_call(&self) -> Result<(), CallError> {
        self.request(|reply| CallCommand::EndCall { reply }).await
    }

    pub async fn toggle_video(&self) -> Result<bool, CallError> {
        self.request(|reply| CallCommand::ToggleVideo { reply }).await
    }

    pub async fn toggle_audio(&self) -> Result<bool, CallError> {
        self.request(|reply| CallCommand::ToggleAudio { reply }).await
    }

    pub fn subscribe(&self) -> watch::Receiver<CallSnapshot> {
        self.state_rx.clone()
    }

    pub fn snapshot(&self) -> CallSnapshot {
        self.state_rx.borrow().clone()
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> CallCommand,
    ) -> Result<T, CallError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| CallError::ServiceStopped)?;
        response.await.map_err(|_| CallError::ServiceStopped)
    }
}
