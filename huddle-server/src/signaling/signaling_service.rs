use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use huddle_core::{IceServerConfig, ParticipantId, RoomId, SignalMessage, TrackInfo};
use tokio::sync::mpsc;
use tracing::{error, warn};

use crate::signaling::signaling_output::SignalingOutput;

struct SignalingInner {
    peers: DashMap<ParticipantId, mpsc::UnboundedSender<Message>>,
    ice_servers: Vec<IceServerConfig>,
}

/// Registry of connected signaling clients plus the JSON encoder for
/// outbound messages.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                peers: DashMap::new(),
                ice_servers,
            }),
        }
    }

    pub fn add_peer(&self, participant: ParticipantId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.peers.insert(participant, tx);
    }

    pub fn remove_peer(&self, participant: &ParticipantId) {
        self.inner.peers.remove(participant);
    }

    /// STUN/TURN handshake sent to every freshly connected client.
    pub fn send_ice_config(&self, participant: &ParticipantId) {
        self.send_signal(
            participant,
            SignalMessage::IceConfig {
                ice_servers: self.inner.ice_servers.clone(),
            },
        );
    }

    fn send_signal(&self, participant: &ParticipantId, msg: SignalMessage) {
        let Some(peer) = self.inner.peers.get(participant) else {
            warn!(%participant, "signal for disconnected participant dropped");
            return;
        };
        match serde_json::to_string(&msg) {
            Ok(json) => {
                if let Err(e) = peer.send(Message::Text(json.into())) {
                    error!(%participant, error = ?e, "sending WS message failed");
                }
            }
            Err(e) => error!(error = ?e, "serializing signal message failed"),
        }
    }
}

#[async_trait]
impl SignalingOutput for SignalingService {
    async fn send_answer(&self, participant: ParticipantId, sdp: String) {
        let msg = SignalMessage::Answer {
            user_id: participant.clone(),
            sdp,
        };
        self.send_signal(&participant, msg);
    }

    async fn send_offer(&self, participant: ParticipantId, room: RoomId, sdp: String) {
        let msg = SignalMessage::Offer {
            user_id: participant.clone(),
            room_id: room,
            sdp,
            stream_type: None,
        };
        self.send_signal(&participant, msg);
    }

    async fn send_ice(&self, participant: ParticipantId, candidate: String) {
        let msg = SignalMessage::Ice {
            user_id: participant.clone(),
            ice: candidate,
            stream_type: None,
        };
        self.send_signal(&participant, msg);
    }

    async fn send_track_info(
        &self,
        participant: ParticipantId,
        transceiver: HashMap<String, TrackInfo>,
    ) {
        let msg = SignalMessage::Track {
            user_id: participant.clone(),
            transceiver,
        };
        self.send_signal(&participant, msg);
    }

    async fn send_participant_joined(
        &self,
        participant: ParticipantId,
        joined: ParticipantId,
        room: RoomId,
    ) {
        let msg = SignalMessage::Participant {
            user_id: joined,
            room_id: room,
        };
        self.send_signal(&participant, msg);
    }

    async fn send_participant_left(
        &self,
        participant: ParticipantId,
        left: ParticipantId,
        room: RoomId,
    ) {
        let msg = SignalMessage::Leave {
            id: left,
            room_id: room,
        };
        self.send_signal(&participant, msg);
    }
}
