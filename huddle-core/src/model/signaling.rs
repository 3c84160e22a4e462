use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::media::StreamType;
use crate::model::participant::ParticipantId;
use crate::model::room::RoomId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

/// Ownership metadata for one negotiated media line. `user_id` is absent
/// when the sender itself is the owner (client-published lines).
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<ParticipantId>,
    pub stream_type: StreamType,
}

/// Signaling envelope exchanged over the transport. The `path` tag selects
/// the handler; `payload` carries the message body. `sdp` and `ice` fields
/// are JSON documents re-parsed on receipt, never raw SDP text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "path", content = "payload")]
pub enum SignalMessage {
    /// STUN/TURN endpoints, sent by the server right after the transport
    /// connects.
    #[serde(rename = "ICE-CONFIG", rename_all = "camelCase")]
    IceConfig { ice_servers: Vec<IceServerConfig> },

    #[serde(rename = "OFFER", rename_all = "camelCase")]
    Offer {
        user_id: ParticipantId,
        room_id: RoomId,
        sdp: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stream_type: Option<StreamType>,
    },

    #[serde(rename = "ANSWER", rename_all = "camelCase")]
    Answer { user_id: ParticipantId, sdp: String },

    #[serde(rename = "ICE", rename_all = "camelCase")]
    Ice {
        user_id: ParticipantId,
        ice: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stream_type: Option<StreamType>,
    },

    /// `mid → ownership` attribution for negotiated media lines. Clients
    /// send it to describe lines they publish; the server sends it after a
    /// renegotiation so viewers can attribute what they receive.
    #[serde(rename = "TRACK", rename_all = "camelCase")]
    Track {
        user_id: ParticipantId,
        transceiver: HashMap<String, TrackInfo>,
    },

    #[serde(rename = "LEAVE", rename_all = "camelCase")]
    Leave { id: ParticipantId, room_id: RoomId },

    /// Membership announcement: inbound it requests a join without an
    /// offer, outbound it tells existing members who arrived.
    #[serde(rename = "PARTICIPANT", rename_all = "camelCase")]
    Participant {
        user_id: ParticipantId,
        room_id: RoomId,
    },

    /// Client asks the server to start a renegotiation.
    #[serde(rename = "NEGOTIATION-REQUEST", rename_all = "camelCase")]
    NegotiationRequest { user_id: ParticipantId },
}
