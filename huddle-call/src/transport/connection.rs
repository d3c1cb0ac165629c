use async_trait::async_trait;
use huddle_core::IceCandidate;

use crate::error::NegotiationError;
use crate::media::LocalStream;
use crate::transport::TransportSink;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SdpKind {
    Offer,
    Answer,
}

/// One underlying peer-to-peer connection.
#[async_trait]
pub trait PeerConnection: Send + Sync {
    /// Create an offer and install it as the local description. Returns the SDP.
    async fn create_offer(&self) -> Result<String, NegotiationError>;

    /// Create an answer and install it as the local description. Returns the SDP.
    async fn create_answer(&self) -> Result<String, NegotiationError>;

    async fn set_remote_description(&self, kind: SdpKind, sdp: String)
    -> Result<(), NegotiationError>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), NegotiationError>;

    async fn close(&self) -> Result<(), NegotiationError>;
}

/// Creates connections with the local tracks attached.
///
/// Every callback of the created connection must go through `sink`.
#[async_trait]
pub trait PeerConnectionFactory: Send + Sync {
    async fn create(
        &self,
        local: &LocalStream,
        sink: TransportSink,
    ) -> Result<Box<dyn PeerConnection>, NegotiationError>;
}
