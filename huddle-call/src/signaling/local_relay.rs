use async_trait::async_trait;
use dashmap::DashMap;
use huddle_core::{Envelope, PeerId, SignalMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::SignalingDeliveryError;
use crate::signaling::SignalingChannel;

struct RelayInner {
    members: DashMap<PeerId, mpsc::UnboundedSender<Envelope>>,
}

/// In-process signaling relay for one room.
///
/// Every frame goes through its JSON text form on the way, the same text a
/// network relay would carry.
#[derive(Clone)]
pub struct LocalRelay {
    inner: Arc<RelayInner>,
}

impl LocalRelay {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RelayInner {
                members: DashMap::new(),
            }),
        }
    }

    /// Attach a participant. Returns its outbound endpoint and inbound stream.
    pub fn connect(&self, peer_id: PeerId) -> (RelayEndpoint, mpsc::UnboundedReceiver<Envelope>) {
        let (tx, rx) = mpsc::unbounded_channel();

        if self.inner.members.insert(peer_id.clone(), tx).is_some() {
            warn!("Participant {} reconnected to the relay", peer_id);
        }

        let endpoint = RelayEndpoint {
            relay: self.clone(),
            peer_id,
        };
        (endpoint, rx)
    }

    /// Detach a participant. Its inbound stream ends once queued frames drain.
    pub fn disconnect(&self, peer_id: &PeerId) {
        self.inner.members.remove(peer_id);
    }

    fn deliver(&self, target: &PeerId, frame: &str) -> Result<(), SignalingDeliveryError> {
        let Some(member) = self.inner.members.get(target) else {
            return Err(SignalingDeliveryError::UnknownTarget(target.clone()));
        };
        let envelope: Envelope = serde_json::from_str(frame)?;
        member
            .send(envelope)
            .map_err(|_| SignalingDeliveryError::UnknownTarget(target.clone()))
    }
}

impl Default for LocalRelay {
    fn default() -> Self {
        Self::new()
    }
}

/// One participant's connection to a `LocalRelay`.
#[derive(Clone)]
pub struct RelayEndpoint {
    relay: LocalRelay,
    peer_id: PeerId,
}

impl RelayEndpoint {
    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    fn encode(&self, message: SignalMessage) -> Result<String, SignalingDeliveryError> {
        let envelope = Envelope {
            from: self.peer_id.clone(),
            signal: message,
        };
        Ok(serde_json::to_string(&envelope)?)
    }
}

#[async_trait]
impl SignalingChannel for RelayEndpoint {
    async fn send_to(
        &self,
        target: &PeerId,
        message: SignalMessage,
    ) -> Result<(), SignalingDeliveryError> {
        if !self.relay.inner.members.contains_key(&self.peer_id) {
            return Err(SignalingDeliveryError::RelayUnavailable);
        }
        debug!(
            "Relaying {} from {} to {}",
            message.event_name(),
            self.peer_id,
            target
        );
        let frame = self.encode(message)?;
        self.relay.deliver(target, &frame)
    }

    async fn broadcast(&self, message: SignalMessage) -> Result<(), SignalingDeliveryError> {
        if !self.relay.inner.members.contains_key(&self.peer_id) {
            return Err(SignalingDeliveryError::RelayUnavailable);
        }
        let frame = self.encode(message)?;

        // Collect first so no map guard is held while sending.
        let targets: Vec<PeerId> = self
            .relay
            .inner
            .members
            .iter()
            .map(|entry| entry.key().clone())
            .filter(|id| id != &self.peer_id)
            .collect();

        for target in targets {
            if let Err(e) = self.relay.deliver(&target, &frame) {
                warn!("Broadcast from {} skipped {}: {}", self.peer_id, target, e);
            }
        }
        Ok(())
    }
}
