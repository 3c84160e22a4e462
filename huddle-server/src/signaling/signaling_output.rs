use std::collections::HashMap;

use async_trait::async_trait;
use huddle_core::{ParticipantId, RoomId, TrackInfo};

/// Outbound half of the signaling transport. The engine talks to clients
/// exclusively through this trait; the WebSocket service implements it and
/// tests substitute a capturing mock.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// SDP answer to a client offer.
    async fn send_answer(&self, participant: ParticipantId, sdp: String);

    /// Server-initiated (re)negotiation offer.
    async fn send_offer(&self, participant: ParticipantId, room: RoomId, sdp: String);

    /// Locally gathered ICE candidate.
    async fn send_ice(&self, participant: ParticipantId, candidate: String);

    /// `mid → owner` attribution for freshly negotiated media lines.
    async fn send_track_info(
        &self,
        participant: ParticipantId,
        transceiver: HashMap<String, TrackInfo>,
    );

    /// Another participant entered the recipient's room.
    async fn send_participant_joined(
        &self,
        participant: ParticipantId,
        joined: ParticipantId,
        room: RoomId,
    );

    /// A participant left the recipient's room.
    async fn send_participant_left(
        &self,
        participant: ParticipantId,
        left: ParticipantId,
        room: RoomId,
    );
}
