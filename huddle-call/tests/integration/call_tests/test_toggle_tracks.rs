use huddle_core::TrackKind;

use crate::integration::{create_solo, init_tracing};
use crate::utils::join_from;

#[tokio::test]
async fn test_toggle_video_twice_restores_without_renegotiation() {
    init_tracing();

    let mut solo = create_solo("a", "Alice");
    solo.controller.start_call().await.expect("start_call failed");
    solo.controller.handle_signal(join_from("b", "Bob")).await;
    assert_eq!(solo.signaling.offer_count().await, 1);

    let local = solo
        .controller
        .snapshot()
        .local_stream
        .expect("no local stream");

    assert!(!solo.controller.toggle_video());
    let snapshot = solo.controller.snapshot();
    assert!(!snapshot.is_video_enabled);
    assert!(snapshot.is_audio_enabled);
    assert!(local.tracks_of(TrackKind::Video).all(|t| !t.is_enabled()));
    assert!(local.tracks_of(TrackKind::Audio).all(|t| t.is_enabled()));

    assert!(solo.controller.toggle_video());
    assert!(solo.controller.snapshot().is_video_enabled);
    assert!(local.tracks_of(TrackKind::Video).all(|t| t.is_enabled()));

    assert_eq!(solo.signaling.offer_count().await, 1);
    assert_eq!(solo.connections.created().await, 1);
}

#[tokio::test]
async fn test_toggle_audio_only_touches_audio() {
    init_tracing();

    let mut solo = create_solo("a", "Alice");
    solo.controller.start_call().await.expect("start_call failed");
    let local = solo
        .controller
        .snapshot()
        .local_stream
        .expect("no local stream");

    assert!(!solo.controller.toggle_audio());

    let snapshot = solo.controller.snapshot();
    assert!(!snapshot.is_audio_enabled);
    assert!(snapshot.is_video_enabled);
    assert!(local.tracks_of(TrackKind::Audio).all(|t| !t.is_enabled()));
    assert!(local.tracks_of(TrackKind::Video).all(|t| t.is_enabled()));
}

#[tokio::test]
async fn test_toggle_outside_call_changes_nothing() {
    init_tracing();

    let mut solo = create_solo("a", "Alice");

    assert!(solo.controller.toggle_video());
    assert!(solo.controller.toggle_audio());
    assert_eq!(solo.controller.snapshot(), Default::default());
}

#[tokio::test]
async fn test_flags_reset_after_end_call() {
    init_tracing();

    let mut solo = create_solo("a", "Alice");
    solo.controller.start_call().await.expect("start_call failed");
    solo.controller.toggle_video();
    solo.controller.toggle_audio();

    solo.controller.end_call().await;
    solo.controller.start_call().await.expect("restart failed");

    let snapshot = solo.controller.snapshot();
    assert!(snapshot.is_video_enabled);
    assert!(snapshot.is_audio_enabled);
}
