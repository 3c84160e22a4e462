use std::collections::{HashMap, HashSet};

use huddle_core::{ParticipantId, TrackInfo};
use tokio::sync::oneshot;

/// Commands entering a room's event loop from the signaling layer.
#[derive(Debug)]
pub enum RoomCommand {
    /// A client offer: first contact creates the peer connection and joins
    /// the room, later ones renegotiate.
    Offer {
        participant: ParticipantId,
        sdp: String,
    },

    /// A client answer to a server-initiated (re)negotiation offer.
    Answer {
        participant: ParticipantId,
        sdp: String,
    },

    /// Inbound trickle ICE candidate.
    IceCandidate {
        participant: ParticipantId,
        candidate: String,
    },

    /// Client-declared `mid → stream type` metadata for published lines.
    TrackMetadata {
        participant: ParticipantId,
        transceiver: HashMap<String, TrackInfo>,
    },

    /// Join without an offer; the server makes the first offer.
    Join { participant: ParticipantId },

    /// Client asks the server to start a renegotiation.
    Negotiate { participant: ParticipantId },

    /// Explicit leave.
    Leave { participant: ParticipantId },

    /// Transport died; same cleanup as an explicit leave.
    Disconnect { participant: ParticipantId },

    /// Snapshot of the current member set.
    Members {
        reply: oneshot::Sender<HashSet<ParticipantId>>,
    },
}
