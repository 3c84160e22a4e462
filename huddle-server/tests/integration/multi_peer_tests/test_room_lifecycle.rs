use std::sync::Arc;
use std::time::Duration;

use huddle_core::{ParticipantId, RoomId};
use huddle_server::{PeerRegistry, RoomCommand, RoomManager, TransportConfig};
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;

use crate::integration::init_tracing;
use crate::utils::{MockSignalingOutput, OutboundSignal, TestClient, perform_join};

#[tokio::test]
async fn test_two_peers_room_lifecycle() {
    init_tracing();

    let signaling = MockSignalingOutput::new();
    let registry = PeerRegistry::new();
    let rooms = RoomManager::new(
        registry.clone(),
        Arc::new(signaling.clone()),
        TransportConfig::default(),
    );

    let room_id = RoomId::generate();
    let cmd_tx = rooms.room_sender(&room_id);

    let alice = TestClient::new(ParticipantId::generate())
        .await
        .expect("alice");
    alice
        .publish_kind(RTPCodecType::Audio)
        .await
        .expect("audio line");
    perform_join(&alice, &cmd_tx, &signaling)
        .await
        .expect("alice joins");

    let bob = TestClient::new(ParticipantId::generate()).await.expect("bob");
    bob.publish_kind(RTPCodecType::Audio)
        .await
        .expect("audio line");
    perform_join(&bob, &cmd_tx, &signaling)
        .await
        .expect("bob joins");

    // Alice hears about Bob's arrival.
    let announced = signaling
        .wait_for(2000, |s| {
            matches!(
                s,
                OutboundSignal::ParticipantJoined { participant, joined }
                    if *participant == alice.participant && *joined == bob.participant
            )
        })
        .await;
    assert!(announced, "join broadcast reached the earlier member");

    assert!(rooms.is_active(&room_id));
    let members = rooms.members(&room_id).await;
    assert_eq!(members.len(), 2);
    assert!(members.contains(&alice.participant));
    assert!(members.contains(&bob.participant));

    // Bob leaves: Alice is notified, Bob's entry is gone, the room stays.
    cmd_tx
        .send(RoomCommand::Leave {
            participant: bob.participant.clone(),
        })
        .await
        .expect("bob leave");
    let notified = signaling
        .wait_for(2000, |s| {
            matches!(
                s,
                OutboundSignal::ParticipantLeft { participant, left }
                    if *participant == alice.participant && *left == bob.participant
            )
        })
        .await;
    assert!(notified, "leave broadcast reached the survivor");
    // the broadcast follows registry teardown, so the entry is gone by now
    assert!(registry.get(&bob.participant).is_none());
    assert!(rooms.is_active(&room_id), "room survives with one member");
    assert_eq!(rooms.members(&room_id).await.len(), 1);

    // Last leave deletes the room entry entirely.
    cmd_tx
        .send(RoomCommand::Leave {
            participant: alice.participant.clone(),
        })
        .await
        .expect("alice leave");
    let mut deleted = false;
    for _ in 0..100 {
        if !rooms.is_active(&room_id) {
            deleted = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    assert!(deleted, "empty room removed from the directory");
    assert!(rooms.members(&room_id).await.is_empty());

    alice.close().await.expect("close alice");
    bob.close().await.expect("close bob");
}

#[tokio::test]
async fn test_join_is_idempotent() {
    init_tracing();

    let signaling = MockSignalingOutput::new();
    let registry = PeerRegistry::new();
    let rooms = RoomManager::new(
        registry,
        Arc::new(signaling.clone()),
        TransportConfig::default(),
    );

    let room_id = RoomId::generate();
    let cmd_tx = rooms.room_sender(&room_id);

    let participant = ParticipantId::generate();
    cmd_tx
        .send(RoomCommand::Join {
            participant: participant.clone(),
        })
        .await
        .expect("join");
    cmd_tx
        .send(RoomCommand::Join {
            participant: participant.clone(),
        })
        .await
        .expect("repeat join");

    let mut members = rooms.members(&room_id).await;
    for _ in 0..100 {
        if !members.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
        members = rooms.members(&room_id).await;
    }
    assert_eq!(members.len(), 1, "duplicate join collapses to one member");

    cmd_tx
        .send(RoomCommand::Leave { participant })
        .await
        .expect("leave");
}
