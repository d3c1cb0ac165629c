use async_trait::async_trait;
use huddle_call::{SignalingChannel, SignalingDeliveryError};
use huddle_core::{IceCandidate, PeerId, SignalMessage};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, mpsc};

#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    To(PeerId, SignalMessage),
    Broadcast(SignalMessage),
}

/// Mock SignalingChannel that captures all outgoing frames.
#[derive(Clone)]
pub struct MockSignaling {
    /// Channel to send captured frames.
    tx: mpsc::UnboundedSender<Outgoing>,
    /// All captured frames (for verification).
    sent: Arc<Mutex<Vec<Outgoing>>>,
    /// When set, every send fails with `RelayUnavailable`.
    unavailable: Arc<AtomicBool>,
}

impl MockSignaling {
    /// Create a new MockSignaling and its receiver channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Outgoing>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let signaling = Self {
            tx,
            sent: Arc::new(Mutex::new(Vec::new())),
            unavailable: Arc::new(AtomicBool::new(false)),
        };
        (signaling, rx)
    }

    /// Create a MockSignaling without a receiver (frames are only stored).
    pub fn new_stored_only() -> Self {
        let (signaling, _rx) = Self::new();
        signaling
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<Outgoing> {
        self.sent.lock().await.clone()
    }

    pub async fn broadcasts(&self) -> Vec<SignalMessage> {
        self.sent
            .lock()
            .await
            .iter()
            .filter_map(|o| match o {
                Outgoing::Broadcast(message) => Some(message.clone()),
                Outgoing::To(..) => None,
            })
            .collect()
    }

    /// All SDP offers sent to a specific peer.
    pub async fn offers_to(&self, peer_id: &PeerId) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter_map(|o| match o {
                Outgoing::To(id, SignalMessage::Offer { sdp, .. }) if id == peer_id => {
                    Some(sdp.clone())
                }
                _ => None,
            })
            .collect()
    }

    /// All SDP answers sent to a specific peer.
    pub async fn answers_to(&self, peer_id: &PeerId) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter_map(|o| match o {
                Outgoing::To(id, SignalMessage::Answer { sdp, .. }) if id == peer_id => {
                    Some(sdp.clone())
                }
                _ => None,
            })
            .collect()
    }

    /// All ICE candidates sent to a specific peer.
    pub async fn candidates_to(&self, peer_id: &PeerId) -> Vec<IceCandidate> {
        self.sent
            .lock()
            .await
            .iter()
            .filter_map(|o| match o {
                Outgoing::To(id, SignalMessage::IceCandidate { candidate, .. })
                    if id == peer_id =>
                {
                    Some(candidate.clone())
                }
                _ => None,
            })
            .collect()
    }

    /// Number of offers sent to anyone.
    pub async fn offer_count(&self) -> usize {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|o| matches!(o, Outgoing::To(_, SignalMessage::Offer { .. })))
            .count()
    }

    async fn capture(&self, frame: Outgoing) -> Result<(), SignalingDeliveryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SignalingDeliveryError::RelayUnavailable);
        }
        self.sent.lock().await.push(frame.clone());
        let _ = self.tx.send(frame);
        Ok(())
    }
}

impl Default for MockSignaling {
    fn default() -> Self {
        Self::new_stored_only()
    }
}

#[async_trait]
impl SignalingChannel for MockSignaling {
    async fn send_to(
        &self,
        target: &PeerId,
        message: SignalMessage,
    ) -> Result<(), SignalingDeliveryError> {
        tracing::debug!(
            "[MockSignaling] {} to {:?}",
            message.event_name(),
            target
        );
        self.capture(Outgoing::To(target.clone(), message)).await
    }

    async fn broadcast(&self, message: SignalMessage) -> Result<(), SignalingDeliveryError> {
        tracing::debug!("[MockSignaling] broadcast {}", message.event_name());
        self.capture(Outgoing::Broadcast(message)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_signaling_captures_offer() {
        let (signaling, mut rx) = MockSignaling::new();
        let peer_id = PeerId::from("bob");

        signaling
            .send_to(
                &peer_id,
                SignalMessage::Offer {
                    sdp: "test-sdp".to_string(),
                    target_peer_id: peer_id.clone(),
                },
            )
            .await
            .unwrap();

        let frame = rx.recv().await.unwrap();
        assert!(matches!(frame, Outgoing::To(_, SignalMessage::Offer { .. })));
        assert_eq!(signaling.offers_to(&peer_id).await, vec!["test-sdp".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_signaling_can_be_unavailable() {
        let signaling = MockSignaling::new_stored_only();
        signaling.set_unavailable(true);

        let result = signaling
            .broadcast(SignalMessage::Join {
                peer_id: PeerId::from("alice"),
                name: "Alice".to_string(),
            })
            .await;

        assert!(matches!(result, Err(SignalingDeliveryError::RelayUnavailable)));
        assert!(signaling.sent().await.is_empty());
    }
}
