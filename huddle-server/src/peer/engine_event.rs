use std::sync::Arc;

use huddle_core::{MediaKind, ParticipantId};
use webrtc::track::track_local::track_local_static_rtp::TrackLocalStaticRTP;

/// Events raised by a participant's WebRTC engine and routed into its
/// room's event loop.
pub enum EngineEvent {
    /// An inbound media line started; `track` is the forwardable copy fed
    /// by the RTP pump.
    TrackArrived {
        participant: ParticipantId,
        mid: String,
        kind: MediaKind,
        track: Arc<TrackLocalStaticRTP>,
    },
    /// The RTP pump for a forwarded track ran dry: the sender stopped it
    /// or the connection went away.
    TrackEnded { participant: ParticipantId, mid: String },
    /// The underlying connection reached a terminal state.
    Disconnected { participant: ParticipantId },
}
