use huddle_core::{Envelope, Participant, SignalMessage, TrackKind};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::call::{CallCommand, CallSnapshot, LocalCallState};
use crate::error::CallError;
use crate::media::{LocalMedia, MediaConstraints};
use crate::peer::PeerManager;
use crate::signaling::SignalingChannel;
use crate::transport::{PeerConnectionFactory, TransportEvent};

/// Top-level call lifecycle of one participant.
///
/// Can be driven step by step through its methods, or handed to `run`
/// (usually via `CallHandle::spawn`) to process commands, relay frames and
/// connection callbacks on a single loop.
pub struct CallController {
    me: Participant,
    media: Arc<dyn LocalMedia>,
    signaling: Arc<dyn SignalingChannel>,
    peers: PeerManager,
    local: Option<LocalCallState>,
    constraints: MediaConstraints,
    transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
    state_tx: watch::Sender<CallSnapshot>,
}

impl CallController {
    pub fn new(
        me: Participant,
        signaling: Arc<dyn SignalingChannel>,
        media: Arc<dyn LocalMedia>,
        connections: Arc<dyn PeerConnectionFactory>,
    ) -> Self {
        let (transport_tx, transport_rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(CallSnapshot::default());

        let peers = PeerManager::new(
            me.id.clone(),
            Arc::clone(&signaling),
            connections,
            transport_tx,
        );

        Self {
            me,
            media,
            signaling,
            peers,
            local: None,
            constraints: MediaConstraints::default(),
            transport_rx,
            state_tx,
        }
    }

    pub fn with_constraints(mut self, constraints: MediaConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn me(&self) -> &Participant {
        &self.me
    }

    pub fn peers(&self) -> &PeerManager {
        &self.peers
    }

    pub fn is_in_call(&self) -> bool {
        self.local.is_some()
    }

    /// Acquire local media and announce ourselves to the room.
    ///
    /// Starting an active call again does nothing.
    pub async fn start_call(&mut self) -> Result<(), CallError> {
        if self.local.is_some() {
            debug!("{} is already in the call", self.me.id);
            return Ok(());
        }

        let stream = match self.media.acquire(self.constraints).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Could not start call for {}: {}", self.me.id, e);
                return Err(e.into());
            }
        };

        info!(
            "{} ({}) starting call with stream {}",
            self.me.display_name,
            self.me.id,
            stream.id()
        );
        self.peers.attach_local_stream(stream.clone());
        self.local = Some(LocalCallState::new(stream));

        let join = SignalMessage::Join {
            peer_id: self.me.id.clone(),
            name: self.me.display_name.clone(),
        };
        if let Err(e) = self.signaling.broadcast(join).await {
            warn!("Failed to announce join of {}: {}", self.me.id, e);
        }

        self.publish();
        Ok(())
    }

    /// Stop local media, close every session and announce the leave.
    /// Idempotent.
    pub async fn end_call(&mut self) {
        let Some(local) = self.local.take() else {
            return;
        };

        info!("{} ({}) ending call", self.me.display_name, self.me.id);
        local.stream.stop();
        self.peers.close_all().await;
        self.peers.detach_local_stream();

        let leave = SignalMessage::Leave {
            peer_id: self.me.id.clone(),
            name: self.me.display_name.clone(),
        };
        if let Err(e) = self.signaling.broadcast(leave).await {
            warn!("Failed to announce leave of {}: {}", self.me.id, e);
        }

        self.publish();
    }

    /// Flip the local video tracks. Returns the new flag.
    pub fn toggle_video(&mut self) -> bool {
        self.toggle(TrackKind::Video)
    }

    /// Flip the local audio tracks. Returns the new flag.
    pub fn toggle_audio(&mut self) -> bool {
        self.toggle(TrackKind::Audio)
    }

    // Only the local tracks change; sessions keep their negotiated media.
    fn toggle(&mut self, kind: TrackKind) -> bool {
        let Some(local) = self.local.as_mut() else {
            return true;
        };

        let flag = match kind {
            TrackKind::Video => &mut local.video_enabled,
            TrackKind::Audio => &mut local.audio_enabled,
        };
        *flag = !*flag;
        let enabled = *flag;

        local.stream.set_enabled(kind, enabled);
        debug!(
            "{} turned {} {}",
            self.me.id,
            kind,
            if enabled { "on" } else { "off" }
        );

        self.publish();
        enabled
    }

    /// Process one frame from the relay.
    pub async fn handle_signal(&mut self, envelope: Envelope) {
        self.peers.dispatch(envelope).await;
        self.publish();
    }

    /// Process one connection callback.
    pub async fn handle_transport_event(&mut self, event: TransportEvent) {
        self.peers.on_transport_event(event).await;
        self.publish();
    }

    /// Handle every connection callback queued so far. Returns how many ran.
    pub async fn drain_transport_events(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.transport_rx.try_recv() {
            self.peers.on_transport_event(event).await;
            handled += 1;
        }
        if handled > 0 {
            self.publish();
        }
        handled
    }

    pub fn subscribe(&self) -> watch::Receiver<CallSnapshot> {
        self.state_tx.subscribe()
    }

    pub fn snapshot(&self) -> CallSnapshot {
        self.state_tx.borrow().clone()
    }

    fn build_snapshot(&self) -> CallSnapshot {
        let (local_stream, is_video_enabled, is_audio_enabled) = match &self.local {
            Some(local) => (
                Some(local.stream.clone()),
                local.video_enabled,
                local.audio_enabled,
            ),
            None => (None, true, true),
        };

        CallSnapshot {
            local_stream,
            remote_streams: self.peers.remote_streams(),
            remote_usernames: self.peers.usernames(),
            is_in_call: self.local.is_some(),
            is_video_enabled,
            is_audio_enabled,
        }
    }

    fn publish(&self) {
        let next = self.build_snapshot();
        self.state_tx.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    /// Event loop. Exits when the relay stream or every command sender is
    /// gone, ending the call first.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<CallCommand>,
        mut inbound: mpsc::UnboundedReceiver<Envelope>,
    ) {
        info!("Call loop for {} started", self.me.id);

        loop {
            tokio::select! {
                cmd = commands.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("Command channel closed. Shutting down call loop.");
                            break;
                        }
                    }
                }

                envelope = inbound.recv() => {
                    match envelope {
                        Some(e) => self.handle_signal(e).await,
                        None => {
                            warn!("Relay stream for {} ended", self.me.id);
                            break;
                        }
                    }
                }

                Some(event) = self.transport_rx.recv() => {
                    self.handle_transport_event(event).await;
                }
            }
        }

        self.end_call().await;
        info!("Call loop for {} finished", self.me.id);
    }

    async fn handle_command(&mut self, cmd: CallCommand) {
        match cmd {
            CallCommand::StartCall { reply } => {
                let result = self.start_call().await;
                let _ = reply.send(result);
            }
            CallCommand::EndCall { reply } => {
                self.end_call().await;
                let _ = reply.send(());
            }
            CallCommand::ToggleVideo { reply } => {
                let _ = reply.send(self.toggle_video());
            }
            CallCommand::ToggleAudio { reply } => {
                let _ = reply.send(self.toggle_audio());
            }
        }
    }
}
