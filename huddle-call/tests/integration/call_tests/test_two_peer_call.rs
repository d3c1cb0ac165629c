use huddle_call::{SdpKind, SessionState};
use huddle_core::{PeerId, TrackKind};

use crate::integration::init_tracing;
use crate::utils::Mesh;

#[tokio::test]
async fn test_two_peers_connect_and_part() {
    init_tracing();

    let mut mesh = Mesh::new();
    let alice = mesh.join("a", "Alice");
    let bob = mesh.join("b", "Bob");

    mesh.controller("a").start_call().await.expect("Alice failed to start");
    mesh.settle().await;
    mesh.controller("b").start_call().await.expect("Bob failed to start");
    mesh.settle().await;

    // Alice was in the call first, so she offers to Bob.
    assert_eq!(
        mesh.node("a").controller.peers().session_state(&bob),
        Some(SessionState::Connected)
    );
    assert_eq!(
        mesh.node("b").controller.peers().session_state(&alice),
        Some(SessionState::Connected)
    );
    let alice_side = mesh.node("a").connections.latest_to(&bob).await.expect("no connection");
    assert_eq!(alice_side.offers(), 1);
    assert_eq!(alice_side.remote_descriptions().await[0].0, SdpKind::Answer);
    let bob_side = mesh.node("b").connections.latest_to(&alice).await.expect("no connection");
    assert_eq!(bob_side.answers(), 1);

    let alice_view = mesh.node("a").snapshot();
    let stream = alice_view.remote_streams.get(&bob).expect("Alice sees no stream");
    assert_eq!(stream.id, "b-0");
    assert!(stream.has_kind(TrackKind::Video));
    assert_eq!(alice_view.remote_usernames.get(&bob), Some(&"Bob".to_string()));

    let bob_view = mesh.node("b").snapshot();
    assert_eq!(bob_view.remote_streams.get(&alice).map(|s| s.id.as_str()), Some("a-0"));
    assert_eq!(bob_view.remote_usernames.get(&alice), Some(&"Alice".to_string()));

    mesh.controller("b").end_call().await;
    mesh.settle().await;

    let alice_view = mesh.node("a").snapshot();
    assert!(alice_view.remote_streams.is_empty());
    assert!(!alice_view.remote_usernames.contains_key(&bob));
    assert!(mesh.node("a").controller.peers().session(&bob).is_none());
    assert!(alice_side.is_closed());
    assert!(alice_view.is_in_call);
}
