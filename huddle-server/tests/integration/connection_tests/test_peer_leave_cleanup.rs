use std::time::Duration;

use huddle_core::{ParticipantId, RoomId};
use huddle_server::RoomCommand;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;

use crate::integration::{create_test_room, init_tracing};
use crate::utils::{TestClient, perform_join};

#[tokio::test]
async fn test_disconnect_cleans_up_like_leave() {
    init_tracing();

    let room_id = RoomId::generate();
    let room = create_test_room(&room_id);

    let client = TestClient::new(ParticipantId::generate())
        .await
        .expect("client");
    client
        .publish_kind(RTPCodecType::Audio)
        .await
        .expect("audio line");
    perform_join(&client, &room.cmd_tx, &room.signaling)
        .await
        .expect("join handshake");
    assert!(room.registry.get(&client.participant).is_some());

    room.cmd_tx
        .send(RoomCommand::Disconnect {
            participant: client.participant.clone(),
        })
        .await
        .expect("disconnect");

    let mut removed = false;
    for _ in 0..100 {
        if room.registry.get(&client.participant).is_none() {
            removed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    assert!(removed, "peer entry removed on transport death");

    // the only member left, so the room loop shuts down
    let mut closed = false;
    for _ in 0..100 {
        if room.cmd_tx.is_closed() {
            closed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    assert!(closed, "room loop exits once empty");

    client.close().await.expect("close client");
}
