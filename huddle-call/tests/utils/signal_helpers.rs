use huddle_core::{Envelope, IceCandidate, PeerId, SignalMessage};

/// Timeout for a spawned call loop to reach an expected state (ms).
pub const STATE_TIMEOUT_MS: u64 = 5000;

/// SDP in the shape `FakeConnectionFactory` produces and parses.
pub fn fake_sdp(role: &str, stream_id: &str) -> String {
    format!("fake-{} stream={} kinds=audio,video", role, stream_id)
}

pub fn join_from(peer: &str, name: &str) -> Envelope {
    Envelope {
        from: PeerId::from(peer),
        signal: SignalMessage::Join {
            peer_id: PeerId::from(peer),
            name: name.to_string(),
        },
    }
}

pub fn leave_from(peer: &str, name: &str) -> Envelope {
    Envelope {
        from: PeerId::from(peer),
        signal: SignalMessage::Leave {
            peer_id: PeerId::from(peer),
            name: name.to_string(),
        },
    }
}

pub fn offer_from(peer: &str, target: &str, sdp: &str) -> Envelope {
    Envelope {
        from: PeerId::from(peer),
        signal: SignalMessage::Offer {
            sdp: sdp.to_string(),
            target_peer_id: PeerId::from(target),
        },
    }
}

pub fn answer_from(peer: &str, target: &str, sdp: &str) -> Envelope {
    Envelope {
        from: PeerId::from(peer),
        signal: SignalMessage::Answer {
            sdp: sdp.to_string(),
            target_peer_id: PeerId::from(target),
        },
    }
}

pub fn candidate_from(peer: &str, target: &str, candidate: &str) -> Envelope {
    Envelope {
        from: PeerId::from(peer),
        signal: SignalMessage::IceCandidate {
            candidate: IceCandidate::new(candidate),
            target_peer_id: PeerId::from(target),
        },
    }
}
