use huddle_call::SessionState;
use huddle_core::{PeerId, SignalMessage};

use crate::integration::{create_solo, init_tracing};
use crate::utils::{fake_sdp, join_from, offer_from};

#[tokio::test]
async fn test_join_outside_call_only_records_name() {
    init_tracing();

    let mut solo = create_solo("a", "Alice");
    solo.controller.handle_signal(join_from("b", "Bob")).await;

    assert_eq!(solo.controller.peers().session_count(), 0);
    assert_eq!(solo.signaling.offer_count().await, 0);
    assert_eq!(
        solo.controller.snapshot().remote_usernames.get(&PeerId::from("b")),
        Some(&"Bob".to_string())
    );
}

#[tokio::test]
async fn test_join_in_call_creates_offerer_session() {
    init_tracing();

    let mut solo = create_solo("a", "Alice");
    let bob = PeerId::from("b");

    solo.controller.start_call().await.expect("start_call failed");
    assert_eq!(
        solo.signaling.broadcasts().await,
        vec![SignalMessage::Join {
            peer_id: PeerId::from("a"),
            name: "Alice".to_string(),
        }]
    );

    solo.controller.handle_signal(join_from("b", "Bob")).await;

    assert_eq!(
        solo.controller.peers().session_state(&bob),
        Some(SessionState::AwaitingAnswer)
    );
    assert_eq!(
        solo.signaling.offers_to(&bob).await,
        vec![fake_sdp("offer", "a-0")]
    );
}

#[tokio::test]
async fn test_repeated_join_reuses_session() {
    init_tracing();

    let mut solo = create_solo("a", "Alice");
    solo.controller.start_call().await.expect("start_call failed");

    solo.controller.handle_signal(join_from("b", "Bob")).await;
    solo.controller.handle_signal(join_from("b", "Bob")).await;

    assert_eq!(solo.controller.peers().session_count(), 1);
    assert_eq!(solo.connections.created().await, 1);
    assert_eq!(solo.signaling.offer_count().await, 1);
}

#[tokio::test]
async fn test_own_join_is_ignored() {
    init_tracing();

    let mut solo = create_solo("a", "Alice");
    solo.controller.start_call().await.expect("start_call failed");
    solo.controller.handle_signal(join_from("a", "Alice")).await;

    assert_eq!(solo.controller.peers().session_count(), 0);
    assert!(solo.controller.snapshot().remote_usernames.is_empty());
}

#[tokio::test]
async fn test_offer_for_someone_else_is_dropped() {
    init_tracing();

    let mut solo = create_solo("a", "Alice");
    solo.controller.start_call().await.expect("start_call failed");
    solo.controller
        .handle_signal(offer_from("b", "c", &fake_sdp("offer", "b-0")))
        .await;

    assert_eq!(solo.controller.peers().session_count(), 0);
    assert!(solo.signaling.answers_to(&PeerId::from("b")).await.is_empty());
}

#[tokio::test]
async fn test_offer_outside_call_is_ignored() {
    init_tracing();

    let mut solo = create_solo("a", "Alice");
    solo.controller
        .handle_signal(offer_from("b", "a", &fake_sdp("offer", "b-0")))
        .await;

    assert_eq!(solo.controller.peers().session_count(), 0);
    assert_eq!(solo.connections.created().await, 0);
}
