use huddle_core::PeerId;
use std::collections::BTreeMap;

use crate::media::{LocalStream, RemoteStream};

/// Local side of an active call. Exists from a successful start to the end.
#[derive(Debug, Clone)]
pub struct LocalCallState {
    pub stream: LocalStream,
    pub video_enabled: bool,
    pub audio_enabled: bool,
}

impl LocalCallState {
    pub fn new(stream: LocalStream) -> Self {
        Self {
            stream,
            video_enabled: true,
            audio_enabled: true,
        }
    }
}

/// What the presentation layer renders. Rebuilt after every transition.
#[derive(Debug, Clone, PartialEq)]
pub struct CallSnapshot {
    pub local_stream: Option<LocalStream>,
    pub remote_streams: BTreeMap<PeerId, RemoteStream>,
    pub remote_usernames: BTreeMap<PeerId, String>,
    pub is_in_call: bool,
    pub is_video_enabled: bool,
    pub is_audio_enabled: bool,
}

impl Default for CallSnapshot {
    fn default() -> Self {
        Self {
            local_stream: None,
            remote_streams: BTreeMap::new(),
            remote_usernames: BTreeMap::new(),
            is_in_call: false,
            is_video_enabled: true,
            is_audio_enabled: true,
        }
    }
}
