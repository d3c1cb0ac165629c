use async_trait::async_trait;
use huddle_core::{PeerId, SignalMessage};

use crate::error::SignalingDeliveryError;

/// Outbound half of the signaling relay. Inbound frames reach the call
/// controller as `Envelope`s on a channel.
#[async_trait]
pub trait SignalingChannel: Send + Sync {
    /// Deliver a frame to one participant.
    async fn send_to(
        &self,
        target: &PeerId,
        message: SignalMessage,
    ) -> Result<(), SignalingDeliveryError>;

    /// Deliver a frame to every other participant in the room.
    async fn broadcast(&self, message: SignalMessage) -> Result<(), SignalingDeliveryError>;
}
