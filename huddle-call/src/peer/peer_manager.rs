use huddle_core::{Envelope, IceCandidate, PeerId, SignalMessage};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{DispatchError, NegotiationError, StaleEventError};
use crate::media::{LocalStream, RemoteStream};
use crate::peer::{PeerSession, SessionState};
use crate::signaling::SignalingChannel;
use crate::transport::{
    ConnectionId, PeerConnection, PeerConnectionFactory, TransportEvent, TransportSink, TransportState,
};

/// Owns one `PeerSession` per remote participant and routes signaling and
/// transport events to it.
///
/// Every method takes `&mut self`, so creating a session is atomic with
/// respect to any other event. Failures stay inside the affected session:
/// it is closed and dropped from the table, everything else carries on.
pub struct PeerManager {
    self_id: PeerId,
    signaling: Arc<dyn SignalingChannel>,
    connections: Arc<dyn PeerConnectionFactory>,
    transport_tx: mpsc::UnboundedSender<TransportEvent>,
    local_stream: Option<LocalStream>,
    sessions: HashMap<PeerId, PeerSession>,
    usernames: HashMap<PeerId, String>,
    next_connection_id: u64,
}

impl PeerManager {
    pub fn new(
        self_id: PeerId,
        signaling: Arc<dyn SignalingChannel>,
        connections: Arc<dyn PeerConnectionFactory>,
        transport_tx: mpsc::UnboundedSender<TransportEvent>,
    ) -> Self {
        Self {
            self_id,
            signaling,
            connections,
            transport_tx,
            local_stream: None,
            sessions: HashMap::new(),
            usernames: HashMap::new(),
            next_connection_id: 0,
        }
    }

    /// Enter the call. New sessions attach these tracks.
    pub fn attach_local_stream(&mut self, stream: LocalStream) {
        self.local_stream = Some(stream);
    }

    /// Leave the call. Existing sessions are not touched, see `close_all`.
    pub fn detach_local_stream(&mut self) -> Option<LocalStream> {
        self.local_stream.take()
    }

    pub fn is_in_call(&self) -> bool {
        self.local_stream.is_some()
    }

    /// Route one relay frame to the handler for its message type.
    pub async fn dispatch(&mut self, envelope: Envelope) {
        let Envelope { from, signal } = envelope;

        if let Some(target) = signal.target()
            && target != &self.self_id
        {
            debug!(
                "Dropping {} from {} addressed to {}",
                signal.event_name(),
                from,
                target
            );
            return;
        }

        // Join and leave name their subject; negotiation frames concern the sender.
        let (subject, result) = match signal {
            SignalMessage::Join { peer_id, name } => {
                let result = self.on_participant_joined(peer_id.clone(), name).await;
                (peer_id, result)
            }
            SignalMessage::Leave { peer_id, .. } => {
                self.on_participant_left(&peer_id).await;
                (peer_id, Ok(()))
            }
            SignalMessage::Offer { sdp, .. } => {
                let result = self.on_offer(&from, sdp).await;
                (from, result)
            }
            SignalMessage::Answer { sdp, .. } => {
                let result = self.on_answer(&from, sdp).await;
                (from, result)
            }
            SignalMessage::IceCandidate { candidate, .. } => {
                let result = self.on_ice_candidate(&from, candidate).await;
                (from, result)
            }
        };

        self.settle(&subject, result).await;
    }

    async fn on_participant_joined(
        &mut self,
        peer_id: PeerId,
        name: String,
    ) -> Result<(), DispatchError> {
        if peer_id == self.self_id {
            return Ok(());
        }

        info!("Participant {} ({}) joined", name, peer_id);
        self.usernames.insert(peer_id.clone(), name);

        if !self.is_in_call() {
            return Ok(());
        }
        if self.sessions.contains_key(&peer_id) {
            return Err(StaleEventError::SessionExists(peer_id).into());
        }

        let session = self.open_session(&peer_id).await?;
        let session = self.sessions.entry(peer_id.clone()).or_insert(session);
        let sdp = session.start_offer().await?;

        info!("Sending offer to {}", peer_id);
        let offer = SignalMessage::Offer {
            sdp,
            target_peer_id: peer_id.clone(),
        };
        self.deliver(&peer_id, offer).await;
        Ok(())
    }

    async fn on_participant_left(&mut self, peer_id: &PeerId) {
        if peer_id == &self.self_id {
            return;
        }
        if let Some(name) = self.usernames.remove(peer_id) {
            info!("Participant {} ({}) left", name, peer_id);
        }
        self.close(peer_id).await;
    }

    async fn on_offer(&mut self, from: &PeerId, sdp: String) -> Result<(), DispatchError> {
        if !self.is_in_call() {
            return Err(StaleEventError::NotInCall.into());
        }

        match self.sessions.get(from).map(PeerSession::state) {
            None => {
                let session = self.open_session(from).await?;
                self.sessions.insert(from.clone(), session);
            }
            Some(state) if state.is_offering() => {
                // Glare: the lower id keeps its offer.
                if self.self_id < *from {
                    return Err(StaleEventError::OwnOfferWins(from.clone()).into());
                }
                info!("Offer glare with {}, yielding to the remote offer", from);
                let (connection_id, connection) = self.open_connection(from).await?;
                if let Some(session) = self.sessions.get_mut(from) {
                    session.replace_connection(connection_id, connection).await;
                }
            }
            Some(_) => {}
        }

        let session = self
            .sessions
            .get_mut(from)
            .ok_or_else(|| StaleEventError::UnknownPeer(from.clone()))?;
        let answer = session.accept_offer(sdp).await?;

        info!("Sending answer to {}", from);
        let message = SignalMessage::Answer {
            sdp: answer,
            target_peer_id: from.clone(),
        };
        // Fails the session, so the peer's next offer opens a fresh one.
        if !self.deliver(from, message).await {
            return Err(NegotiationError::AnswerUndelivered(from.clone()).into());
        }
        if let Some(session) = self.sessions.get_mut(from) {
            session.answer_delivered();
        }
        Ok(())
    }

    async fn on_answer(&mut self, from: &PeerId, sdp: String) -> Result<(), DispatchError> {
        let session = self
            .sessions
            .get_mut(from)
            .ok_or_else(|| StaleEventError::UnknownPeer(from.clone()))?;
        session.apply_answer(sdp).await?;
        info!("Connected to {} as offerer", from);
        Ok(())
    }

    async fn on_ice_candidate(
        &mut self,
        from: &PeerId,
        candidate: IceCandidate,
    ) -> Result<(), DispatchError> {
        let session = self
            .sessions
            .get_mut(from)
            .ok_or_else(|| StaleEventError::UnknownPeer(from.clone()))?;
        session.add_remote_candidate(candidate).await;
        Ok(())
    }

    /// Handle a callback of one of the session connections.
    pub async fn on_transport_event(&mut self, event: TransportEvent) {
        let peer_id = event.peer_id().clone();
        let result = self.route_transport_event(event).await;
        self.settle(&peer_id, result).await;
    }

    async fn route_transport_event(&mut self, event: TransportEvent) -> Result<(), DispatchError> {
        let peer_id = event.peer_id().clone();
        let connection_id = event.connection_id();

        let session = self
            .sessions
            .get_mut(&peer_id)
            .ok_or_else(|| StaleEventError::UnknownPeer(peer_id.clone()))?;
        if session.connection_id() != connection_id {
            return Err(StaleEventError::SupersededConnection {
                peer_id,
                connection_id,
            }
            .into());
        }

        match event {
            TransportEvent::CandidateGenerated(_, _, candidate) => {
                let message = SignalMessage::IceCandidate {
                    candidate,
                    target_peer_id: peer_id.clone(),
                };
                self.deliver(&peer_id, message).await;
            }
            TransportEvent::TrackArrived(_, _, track) => {
                debug!("Recording remote {} track from {}", track.kind, peer_id);
                session.record_remote_track(track);
            }
            TransportEvent::StateChanged(_, _, state) => match state {
                TransportState::Failed | TransportState::Closed => {
                    return Err(NegotiationError::Transport(state).into());
                }
                TransportState::Disconnected => {
                    warn!("Transport to {} disconnected", peer_id);
                }
                TransportState::Connecting | TransportState::Connected => {
                    debug!("Transport to {} is {}", peer_id, state);
                }
            },
        }
        Ok(())
    }

    /// Close and forget the session with `peer_id`. Idempotent.
    pub async fn close(&mut self, peer_id: &PeerId) -> bool {
        let Some(mut session) = self.sessions.remove(peer_id) else {
            return false;
        };
        session.close().await;
        info!("Closed session with {}", peer_id);
        true
    }

    /// Close every session and forget every participant name.
    pub async fn close_all(&mut self) {
        let sessions: Vec<(PeerId, PeerSession)> = self.sessions.drain().collect();
        for (peer_id, mut session) in sessions {
            session.close().await;
            debug!("Closed session with {}", peer_id);
        }
        self.usernames.clear();
    }

    pub fn session(&self, peer_id: &PeerId) -> Option<&PeerSession> {
        self.sessions.get(peer_id)
    }

    pub fn session_state(&self, peer_id: &PeerId) -> Option<SessionState> {
        self.sessions.get(peer_id).map(PeerSession::state)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn connected_peers(&self) -> Vec<PeerId> {
        let mut peers: Vec<PeerId> = self
            .sessions
            .values()
            .filter(|session| session.state() == SessionState::Connected)
            .map(|session| session.peer_id().clone())
            .collect();
        peers.sort();
        peers
    }

    /// Media of connected sessions only.
    pub fn remote_streams(&self) -> BTreeMap<PeerId, RemoteStream> {
        self.sessions
            .values()
            .filter_map(|session| {
                session
                    .remote_stream()
                    .map(|stream| (session.peer_id().clone(), stream.clone()))
            })
            .collect()
    }

    pub fn usernames(&self) -> BTreeMap<PeerId, String> {
        self.usernames
            .iter()
            .map(|(id, name)| (id.clone(), name.clone()))
            .collect()
    }

    async fn open_session(&mut self, peer_id: &PeerId) -> Result<PeerSession, DispatchError> {
        let (connection_id, connection) = self.open_connection(peer_id).await?;
        Ok(PeerSession::new(peer_id.clone(), connection_id, connection))
    }

    async fn open_connection(
        &mut self,
        peer_id: &PeerId,
    ) -> Result<(ConnectionId, Box<dyn PeerConnection>), DispatchError> {
        let Some(local) = self.local_stream.as_ref() else {
            return Err(StaleEventError::NotInCall.into());
        };

        self.next_connection_id += 1;
        let connection_id = ConnectionId(self.next_connection_id);
        let sink = TransportSink::new(peer_id.clone(), connection_id, self.transport_tx.clone());

        let connection = self.connections.create(local, sink).await?;
        debug!("Opened connection {} to {}", connection_id, peer_id);
        Ok((connection_id, connection))
    }

    /// Send one frame. Delivery failures are logged and never fail a session.
    async fn deliver(&self, target: &PeerId, message: SignalMessage) -> bool {
        let event = message.event_name();
        match self.signaling.send_to(target, message).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to deliver {} to {}: {}", event, target, e);
                false
            }
        }
    }

    async fn settle(&mut self, peer_id: &PeerId, result: Result<(), DispatchError>) {
        match result {
            Ok(()) => {}
            Err(DispatchError::Stale(e)) => {
                debug!("Ignoring stale event from {}: {}", peer_id, e);
            }
            Err(DispatchError::Negotiation(e)) => {
                warn!("Negotiation with {} failed: {}", peer_id, e);
                if let Some(mut session) = self.sessions.remove(peer_id) {
                    session.fail().await;
                }
            }
        }
    }
}
