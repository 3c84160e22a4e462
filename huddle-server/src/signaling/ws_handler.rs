use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use huddle_core::{ParticipantId, RoomId, SignalMessage};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::room::{RoomCommand, RoomManager};
use crate::signaling::SignalingService;

/// Shared state for the signaling endpoint.
#[derive(Clone)]
pub struct SignalingState {
    pub service: SignalingService,
    pub rooms: RoomManager,
}

/// `GET /rooms/{room_id}/ws/{user_id}`, one socket per participant. The
/// room is fixed at upgrade time; ANSWER and ICE frames carry no room id.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path((room_id, user_id)): Path<(String, String)>,
    State(state): State<SignalingState>,
) -> impl IntoResponse {
    let room_id = RoomId::from(room_id);
    let participant = ParticipantId::from(user_id);
    ws.on_upgrade(move |socket| handle_socket(socket, room_id, participant, state))
}

async fn handle_socket(
    socket: WebSocket,
    room_id: RoomId,
    participant: ParticipantId,
    state: SignalingState,
) {
    info!(room = %room_id, %participant, "new signaling connection");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();
    state.service.add_peer(participant.clone(), tx);
    state.service.send_ice_config(&participant);

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    // The room is resolved per message: it spawns on the first command and
    // may be replaced if an emptied room already shut down.
    let mut recv_task = tokio::spawn({
        let participant = participant.clone();
        let rooms = state.rooms.clone();
        let room_id = room_id.clone();
        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<SignalMessage>(&text) {
                        Ok(signal) => {
                            let Some(cmd) = dispatch(signal, &participant) else {
                                continue;
                            };
                            if rooms.room_sender(&room_id).send(cmd).await.is_err() {
                                warn!(%participant, "room command queue closed, message dropped");
                            }
                        }
                        Err(e) => warn!(%participant, error = ?e, "invalid signal message"),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }

            if rooms.is_active(&room_id) {
                let _ = rooms
                    .room_sender(&room_id)
                    .send(RoomCommand::Disconnect {
                        participant: participant.clone(),
                    })
                    .await;
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    state.service.remove_peer(&participant);
    info!(room = %room_id, %participant, "signaling connection closed");
}

/// Translate one inbound message into a room command. The socket's path
/// identity wins over whatever ids the payload claims.
fn dispatch(signal: SignalMessage, participant: &ParticipantId) -> Option<RoomCommand> {
    match signal {
        SignalMessage::Offer { sdp, .. } => Some(RoomCommand::Offer {
            participant: participant.clone(),
            sdp,
        }),
        SignalMessage::Answer { sdp, .. } => Some(RoomCommand::Answer {
            participant: participant.clone(),
            sdp,
        }),
        SignalMessage::Ice { ice, .. } => Some(RoomCommand::IceCandidate {
            participant: participant.clone(),
            candidate: ice,
        }),
        SignalMessage::Track { transceiver, .. } => Some(RoomCommand::TrackMetadata {
            participant: participant.clone(),
            transceiver,
        }),
        SignalMessage::Participant { .. } => Some(RoomCommand::Join {
            participant: participant.clone(),
        }),
        SignalMessage::NegotiationRequest { .. } => Some(RoomCommand::Negotiate {
            participant: participant.clone(),
        }),
        SignalMessage::Leave { .. } => Some(RoomCommand::Leave {
            participant: participant.clone(),
        }),
        // outbound-only path
        SignalMessage::IceConfig { .. } => None,
    }
}
