use huddle_core::{IceCandidate, PeerId};
use std::fmt;
use std::mem;
use tracing::{debug, warn};

use crate::error::{DispatchError, NegotiationError, StaleEventError};
use crate::media::{RemoteStream, RemoteTrack};
use crate::transport::{ConnectionId, PeerConnection, SdpKind};

/// Negotiation state of one remote participant.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SessionState {
    Idle,
    Offering,
    AwaitingAnswer,
    OfferReceived,
    Answering,
    Connected,
    Failed,
    Closed,
}

impl SessionState {
    /// We sent an offer that the peer has not answered yet.
    pub fn is_offering(self) -> bool {
        matches!(self, SessionState::Offering | SessionState::AwaitingAnswer)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Offering => "offering",
            SessionState::AwaitingAnswer => "awaiting-answer",
            SessionState::OfferReceived => "offer-received",
            SessionState::Answering => "answering",
            SessionState::Connected => "connected",
            SessionState::Failed => "failed",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// One remote participant: exactly one connection and its negotiation state.
pub struct PeerSession {
    peer_id: PeerId,
    connection_id: ConnectionId,
    connection: Box<dyn PeerConnection>,
    state: SessionState,
    remote_description_set: bool,
    pending_candidates: Vec<IceCandidate>,
    remote_stream: Option<RemoteStream>,
}

impl PeerSession {
    pub(crate) fn new(
        peer_id: PeerId,
        connection_id: ConnectionId,
        connection: Box<dyn PeerConnection>,
    ) -> Self {
        Self {
            peer_id,
            connection_id,
            connection,
            state: SessionState::Idle,
            remote_description_set: false,
            pending_candidates: Vec::new(),
            remote_stream: None,
        }
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn pending_candidates(&self) -> &[IceCandidate] {
        &self.pending_candidates
    }

    /// The peer's media, once the session is connected.
    pub fn remote_stream(&self) -> Option<&RemoteStream> {
        match self.state {
            SessionState::Connected => self.remote_stream.as_ref(),
            _ => None,
        }
    }

    /// `Idle → Offering → AwaitingAnswer`. Returns the offer SDP.
    pub(crate) async fn start_offer(&mut self) -> Result<String, DispatchError> {
        self.expect_state(&[SessionState::Idle])?;

        self.state = SessionState::Offering;
        match self.connection.create_offer().await {
            Ok(sdp) => {
                self.state = SessionState::AwaitingAnswer;
                Ok(sdp)
            }
            Err(e) => {
                self.state = SessionState::Failed;
                Err(e.into())
            }
        }
    }

    /// `Idle | OfferReceived → OfferReceived → Answering`. Returns the answer SDP.
    pub(crate) async fn accept_offer(&mut self, sdp: String) -> Result<String, DispatchError> {
        self.expect_state(&[SessionState::Idle, SessionState::OfferReceived])?;

        self.state = SessionState::OfferReceived;
        if let Err(e) = self.apply_remote_description(SdpKind::Offer, sdp).await {
            self.state = SessionState::Failed;
            return Err(e.into());
        }

        match self.connection.create_answer().await {
            Ok(answer) => {
                self.state = SessionState::Answering;
                Ok(answer)
            }
            Err(e) => {
                self.state = SessionState::Failed;
                Err(e.into())
            }
        }
    }

    /// The answer reached the relay; negotiation is complete on our side.
    pub(crate) fn answer_delivered(&mut self) {
        if self.state == SessionState::Answering {
            self.state = SessionState::Connected;
        }
    }

    /// `AwaitingAnswer → Connected`. Any other state makes the answer stale.
    pub(crate) async fn apply_answer(&mut self, sdp: String) -> Result<(), DispatchError> {
        self.expect_state(&[SessionState::AwaitingAnswer])?;

        if let Err(e) = self.apply_remote_description(SdpKind::Answer, sdp).await {
            self.state = SessionState::Failed;
            return Err(e.into());
        }
        self.state = SessionState::Connected;
        Ok(())
    }

    /// Apply now, or hold the candidate until a remote description exists.
    pub(crate) async fn add_remote_candidate(&mut self, candidate: IceCandidate) {
        if !self.remote_description_set {
            debug!("Buffering ICE candidate from {}", self.peer_id);
            self.pending_candidates.push(candidate);
            return;
        }
        self.apply_candidate(candidate).await;
    }

    pub(crate) fn record_remote_track(&mut self, track: RemoteTrack) {
        match &mut self.remote_stream {
            Some(stream) => stream.add_track(track),
            None => self.remote_stream = Some(RemoteStream::from_track(track)),
        }
    }

    /// Drop our own negotiation and start over on a fresh connection.
    /// Used when the peer's offer wins a glare tie-break.
    ///
    /// Buffered remote candidates belong to the winning offer and are kept
    /// for the new connection.
    pub(crate) async fn replace_connection(
        &mut self,
        connection_id: ConnectionId,
        connection: Box<dyn PeerConnection>,
    ) {
        let old = mem::replace(&mut self.connection, connection);
        if let Err(e) = old.close().await {
            debug!(
                "Closing superseded connection {} to {}: {}",
                self.connection_id, self.peer_id, e
            );
        }
        self.connection_id = connection_id;
        self.state = SessionState::Idle;
        self.remote_description_set = false;
        self.remote_stream = None;
    }

    /// Stop the connection and discard pending candidates. Idempotent.
    pub(crate) async fn close(&mut self) {
        self.shut_down(SessionState::Closed).await;
    }

    pub(crate) async fn fail(&mut self) {
        self.shut_down(SessionState::Failed).await;
    }

    async fn shut_down(&mut self, terminal: SessionState) {
        self.pending_candidates.clear();
        if self.state == SessionState::Closed {
            return;
        }
        // A failed step leaves the connection open, so close it either way.
        if let Err(e) = self.connection.close().await {
            debug!("Closing connection to {}: {}", self.peer_id, e);
        }
        if self.state != SessionState::Failed {
            self.state = terminal;
        }
    }

    async fn apply_remote_description(
        &mut self,
        kind: SdpKind,
        sdp: String,
    ) -> Result<(), NegotiationError> {
        self.connection.set_remote_description(kind, sdp).await?;
        self.remote_description_set = true;

        let pending = mem::take(&mut self.pending_candidates);
        if !pending.is_empty() {
            debug!(
                "Flushing {} buffered ICE candidates for {}",
                pending.len(),
                self.peer_id
            );
        }
        for candidate in pending {
            self.apply_candidate(candidate).await;
        }
        Ok(())
    }

    // A bad candidate only loses that path, the session stays up.
    async fn apply_candidate(&self, candidate: IceCandidate) {
        if let Err(e) = self.connection.add_ice_candidate(candidate).await {
            warn!("Failed to add ICE candidate for {}: {}", self.peer_id, e);
        }
    }

    fn expect_state(&self, allowed: &[SessionState]) -> Result<(), StaleEventError> {
        if allowed.contains(&self.state) {
            return Ok(());
        }
        Err(StaleEventError::UnexpectedState {
            peer_id: self.peer_id.clone(),
            state: self.state,
        })
    }
}
