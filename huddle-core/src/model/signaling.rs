use crate::model::peer::PeerId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

/// Candidate-init shape shared with browser peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    pub sdp_mid: Option<String>,
    #[serde(rename = "sdpMLineIndex")]
    pub sdp_m_line_index: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_fragment: Option<String>,
}

impl IceCandidate {
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mid: Some("0".to_owned()),
            sdp_m_line_index: Some(0),
            username_fragment: None,
        }
    }
}

/// Call signaling frames. Join and leave are broadcast to the room, the
/// negotiation frames are addressed to a single participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum SignalMessage {
    #[serde(rename_all = "camelCase")]
    Join { peer_id: PeerId, name: String },

    #[serde(rename_all = "camelCase")]
    Leave { peer_id: PeerId, name: String },

    #[serde(rename_all = "camelCase")]
    Offer { sdp: String, target_peer_id: PeerId },

    #[serde(rename_all = "camelCase")]
    Answer { sdp: String, target_peer_id: PeerId },

    #[serde(rename_all = "camelCase")]
    IceCandidate {
        candidate: IceCandidate,
        target_peer_id: PeerId,
    },
}

impl SignalMessage {
    /// Recipient of a unicast frame, `None` for room broadcasts.
    pub fn target(&self) -> Option<&PeerId> {
        match self {
            SignalMessage::Join { .. } | SignalMessage::Leave { .. } => None,
            SignalMessage::Offer { target_peer_id, .. }
            | SignalMessage::Answer { target_peer_id, .. }
            | SignalMessage::IceCandidate { target_peer_id, .. } => Some(target_peer_id),
        }
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            SignalMessage::Join { .. } => "join",
            SignalMessage::Leave { .. } => "leave",
            SignalMessage::Offer { .. } => "offer",
            SignalMessage::Answer { .. } => "answer",
            SignalMessage::IceCandidate { .. } => "ice-candidate",
        }
    }
}

/// A frame as delivered by the relay, stamped with the sender's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub from: PeerId,
    pub signal: SignalMessage,
}
