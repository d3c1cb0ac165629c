use huddle_core::{PeerId, TrackKind};
use thiserror::Error;

use crate::peer::SessionState;
use crate::transport::{ConnectionId, TransportState};

/// Local capture could not produce tracks. The call does not start.
#[derive(Debug, Error)]
pub enum MediaAcquisitionError {
    #[error("permission to capture media was denied")]
    PermissionDenied,

    #[error("no {0} capture device available")]
    NoDevice(TrackKind),

    #[error("media capture failed: {0}")]
    Capture(String),
}

/// The relay could not take a frame. Logged by callers, never fatal to sessions.
#[derive(Debug, Error)]
pub enum SignalingDeliveryError {
    #[error("signaling relay is unreachable")]
    RelayUnavailable,

    #[error("participant {0} is not connected to the relay")]
    UnknownTarget(PeerId),

    #[error("failed to encode signaling frame: {0}")]
    Encode(#[from] serde_json::Error),
}

/// SDP or transport failure for a single peer. Closes only that peer's session.
#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("failed to create peer connection: {0}")]
    Connection(String),

    #[error("failed to create offer: {0}")]
    Offer(String),

    #[error("failed to create answer: {0}")]
    Answer(String),

    #[error("answer to {0} could not be delivered")]
    AnswerUndelivered(PeerId),

    #[error("failed to apply remote description: {0}")]
    RemoteDescription(String),

    #[error("failed to apply ICE candidate: {0}")]
    Candidate(String),

    #[error("transport entered {0} state")]
    Transport(TransportState),
}

/// An event that no longer applies to the current table. Always a silent no-op.
#[derive(Debug, Error)]
pub enum StaleEventError {
    #[error("not in a call")]
    NotInCall,

    #[error("no session for {0}")]
    UnknownPeer(PeerId),

    #[error("session for {0} already exists")]
    SessionExists(PeerId),

    #[error("session for {peer_id} is {state}")]
    UnexpectedState { peer_id: PeerId, state: SessionState },

    #[error("connection {connection_id} of {peer_id} was superseded")]
    SupersededConnection {
        peer_id: PeerId,
        connection_id: ConnectionId,
    },

    #[error("local offer to {0} wins the tie-break")]
    OwnOfferWins(PeerId),
}

#[derive(Debug, Error)]
pub(crate) enum DispatchError {
    #[error(transparent)]
    Stale(#[from] StaleEventError),

    #[error(transparent)]
    Negotiation(#[from] NegotiationError),
}

/// Errors returned to the presentation layer.
#[derive(Debug, Error)]
pub enum CallError {
    #[error(transparent)]
    Media(#[from] MediaAcquisitionError),

    #[error("call service is no longer running")]
    ServiceStopped,
}
