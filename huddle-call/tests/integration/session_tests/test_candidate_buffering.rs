use huddle_call::SessionState;
use huddle_core::PeerId;

use crate::integration::{create_solo, init_tracing};
use crate::utils::{answer_from, candidate_from, fake_sdp, join_from};

fn candidate_names(candidates: &[huddle_core::IceCandidate]) -> Vec<&str> {
    candidates.iter().map(|c| c.candidate.as_str()).collect()
}

#[tokio::test]
async fn test_candidates_buffered_until_answer_then_flushed_in_order() {
    init_tracing();

    let mut solo = create_solo("a", "Alice");
    let bob = PeerId::from("b");

    solo.controller.start_call().await.expect("start_call failed");
    solo.controller.handle_signal(join_from("b", "Bob")).await;
    assert_eq!(
        solo.controller.peers().session_state(&bob),
        Some(SessionState::AwaitingAnswer)
    );

    solo.controller
        .handle_signal(candidate_from("b", "a", "candidate:first"))
        .await;
    solo.controller
        .handle_signal(candidate_from("b", "a", "candidate:second"))
        .await;

    let session = solo.controller.peers().session(&bob).expect("no session");
    assert_eq!(
        candidate_names(session.pending_candidates()),
        vec!["candidate:first", "candidate:second"]
    );

    let connection = solo.connections.latest_to(&bob).await.expect("no connection");
    assert!(connection.applied_candidates().await.is_empty());

    solo.controller
        .handle_signal(answer_from("b", "a", &fake_sdp("answer", "b-0")))
        .await;

    let session = solo.controller.peers().session(&bob).expect("no session");
    assert_eq!(session.state(), SessionState::Connected);
    assert!(session.pending_candidates().is_empty());
    assert_eq!(
        candidate_names(&connection.applied_candidates().await),
        vec!["candidate:first", "candidate:second"]
    );
}

#[tokio::test]
async fn test_candidate_applied_immediately_after_remote_description() {
    init_tracing();

    let mut solo = create_solo("a", "Alice");
    let bob = PeerId::from("b");

    solo.controller.start_call().await.expect("start_call failed");
    solo.controller.handle_signal(join_from("b", "Bob")).await;
    solo.controller
        .handle_signal(answer_from("b", "a", &fake_sdp("answer", "b-0")))
        .await;

    solo.controller
        .handle_signal(candidate_from("b", "a", "candidate:late"))
        .await;

    let session = solo.controller.peers().session(&bob).expect("no session");
    assert!(session.pending_candidates().is_empty());

    let connection = solo.connections.latest_to(&bob).await.expect("no connection");
    assert_eq!(
        candidate_names(&connection.applied_candidates().await),
        vec!["candidate:late"]
    );
}

#[tokio::test]
async fn test_candidate_for_unknown_peer_is_noop() {
    init_tracing();

    let mut solo = create_solo("a", "Alice");
    solo.controller.start_call().await.expect("start_call failed");
    solo.controller.handle_signal(join_from("b", "Bob")).await;

    solo.controller
        .handle_signal(candidate_from("ghost", "a", "candidate:lost"))
        .await;

    assert_eq!(solo.controller.peers().session_count(), 1);
    assert!(solo.controller.peers().session(&PeerId::from("ghost")).is_none());
    assert_eq!(solo.connections.created().await, 1);
}
