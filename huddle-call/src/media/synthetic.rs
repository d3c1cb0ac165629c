use async_trait::async_trait;
use bytes::Bytes;
use huddle_core::TrackKind;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info};
use webrtc::media::Sample;

use crate::error::MediaAcquisitionError;
use crate::media::{LocalMedia, LocalStream, LocalTrack, MediaConstraints};

const OPUS_FRAME: Duration = Duration::from_millis(20);

/// A 20 ms Opus packet that decodes to silence.
const OPUS_SILENCE: [u8; 3] = [0xf8, 0xff, 0xfe];

/// Capture capability without devices, for simulations and headless peers.
///
/// Audio tracks carry Opus silence while enabled; video tracks are negotiated
/// but carry no frames.
pub struct SyntheticMedia {
    label: String,
    denied: bool,
    acquired: AtomicU64,
}

impl SyntheticMedia {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            denied: false,
            acquired: AtomicU64::new(0),
        }
    }

    /// Behaves like a user refusing the capture prompt.
    pub fn denied(label: impl Into<String>) -> Self {
        Self {
            denied: true,
            ..Self::new(label)
        }
    }
}

#[async_trait]
impl LocalMedia for SyntheticMedia {
    async fn acquire(
        &self,
        constraints: MediaConstraints,
    ) -> Result<LocalStream, MediaAcquisitionError> {
        if self.denied {
            return Err(MediaAcquisitionError::PermissionDenied);
        }

        let mut kinds = Vec::new();
        if constraints.audio {
            kinds.push(TrackKind::Audio);
        }
        if constraints.video {
            kinds.push(TrackKind::Video);
        }
        if kinds.is_empty() {
            return Err(MediaAcquisitionError::Capture(
                "no track kind requested".to_owned(),
            ));
        }

        let n = self.acquired.fetch_add(1, Ordering::Relaxed);
        let stream = LocalStream::with_kinds(format!("{}-{}", self.label, n), &kinds);
        info!("Synthetic capture started for stream {}", stream.id());

        for track in stream.tracks_of(TrackKind::Audio) {
            tokio::spawn(pump_silence(track.clone()));
        }

        Ok(stream)
    }
}

async fn pump_silence(track: LocalTrack) {
    let rtp = track.rtp();
    let mut ticker = tokio::time::interval(OPUS_FRAME);

    loop {
        ticker.tick().await;
        if track.is_stopped() {
            break;
        }
        if !track.is_enabled() {
            continue;
        }

        let sample = Sample {
            data: Bytes::from_static(&OPUS_SILENCE),
            duration: OPUS_FRAME,
            ..Default::default()
        };
        if let Err(e) = rtp.write_sample(&sample).await {
            debug!("Dropping silence frame for {}: {}", track.id(), e);
        }
    }

    debug!("Synthetic track {} stopped", track.id());
}
