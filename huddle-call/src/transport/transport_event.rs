use huddle_core::{IceCandidate, PeerId};
use std::fmt;
use tokio::sync::mpsc;

use crate::media::RemoteTrack;

/// Identifies one underlying connection. A session gets a new id whenever
/// its connection is replaced, so callbacks of the old one can be told apart.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TransportState {
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportState::Connecting => "connecting",
            TransportState::Connected => "connected",
            TransportState::Disconnected => "disconnected",
            TransportState::Failed => "failed",
            TransportState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Callbacks of a peer connection, delivered to the call controller's loop.
#[derive(Debug)]
pub enum TransportEvent {
    /// A local ICE candidate was gathered and must be sent to the peer.
    CandidateGenerated(PeerId, ConnectionId, IceCandidate),

    /// The peer's media arrived on this connection.
    TrackArrived(PeerId, ConnectionId, RemoteTrack),

    /// The connection's transport state changed.
    StateChanged(PeerId, ConnectionId, TransportState),
}

impl TransportEvent {
    pub fn peer_id(&self) -> &PeerId {
        match self {
            TransportEvent::CandidateGenerated(peer_id, ..)
            | TransportEvent::TrackArrived(peer_id, ..)
            | TransportEvent::StateChanged(peer_id, ..) => peer_id,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        match self {
            TransportEvent::CandidateGenerated(_, id, _)
            | TransportEvent::TrackArrived(_, id, _)
            | TransportEvent::StateChanged(_, id, _) => *id,
        }
    }
}

/// Handed to a connection at creation; tags every callback with the
/// connection's peer and id.
#[derive(Debug, Clone)]
pub struct TransportSink {
    peer_id: PeerId,
    connection_id: ConnectionId,
    tx: mpsc::UnboundedSender<TransportEvent>,
}

impl TransportSink {
    pub fn new(
        peer_id: PeerId,
        connection_id: ConnectionId,
        tx: mpsc::UnboundedSender<TransportEvent>,
    ) -> Self {
        Self {
            peer_id,
            connection_id,
            tx,
        }
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn candidate(&self, candidate: IceCandidate) {
        self.emit(TransportEvent::CandidateGenerated(
            self.peer_id.clone(),
            self.connection_id,
            candidate,
        ));
    }

    pub fn track(&self, track: RemoteTrack) {
        self.emit(TransportEvent::TrackArrived(
            self.peer_id.clone(),
            self.connection_id,
            track,
        ));
    }

    pub fn state(&self, state: TransportState) {
        self.emit(TransportEvent::StateChanged(
            self.peer_id.clone(),
            self.connection_id,
            state,
        ));
    }

    // The controller may already be gone while a connection shuts down.
    fn emit(&self, event: TransportEvent) {
        let _ = self.tx.send(event);
    }
}
