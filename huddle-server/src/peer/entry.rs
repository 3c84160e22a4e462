use std::sync::Arc;

use huddle_core::{ParticipantId, RoomId};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use webrtc::ice_transport::ice_candidate::RTCIceCandidateInit;
use webrtc::peer_connection::RTCPeerConnection;

/// Negotiation bookkeeping for one peer connection. Guarded as a unit so
/// the ICE queue can never be observed out of sync with `remote_set`.
#[derive(Debug, Default)]
pub struct NegotiationState {
    /// Whether a remote description is currently applied.
    pub remote_set: bool,
    /// Whether a locally created offer is in flight.
    pub making_offer: bool,
    /// Inbound candidates received before the remote description, FIFO.
    pub ice_queue: Vec<RTCIceCandidateInit>,
}

/// One participant's server-side peer connection plus its negotiation
/// state. The connection handle is owned here exclusively; other
/// components only ever hold the `Arc<PeerEntry>`.
#[derive(Debug)]
pub struct PeerEntry {
    pub participant: ParticipantId,
    pub room: RoomId,
    pub connection: Arc<RTCPeerConnection>,
    pub negotiation: Mutex<NegotiationState>,
    negotiation_timer: Mutex<Option<JoinHandle<()>>>,
}

impl PeerEntry {
    pub fn new(participant: ParticipantId, room: RoomId, connection: Arc<RTCPeerConnection>) -> Self {
        Self {
            participant,
            room,
            connection,
            negotiation: Mutex::new(NegotiationState::default()),
            negotiation_timer: Mutex::new(None),
        }
    }

    /// Replace the pending debounce timer, cancelling its predecessor.
    pub(crate) async fn arm_negotiation_timer(&self, handle: JoinHandle<()>) {
        let mut timer = self.negotiation_timer.lock().await;
        if let Some(previous) = timer.replace(handle) {
            previous.abort();
        }
    }

    /// Cancel a pending debounced negotiation, if any.
    pub(crate) async fn abort_negotiation_timer(&self) {
        if let Some(handle) = self.negotiation_timer.lock().await.take() {
            handle.abort();
        }
    }
}
