mod media;
mod participant;
mod room;
mod signaling;

pub use media::{MediaKind, MediaSlots, StreamType};
pub use participant::ParticipantId;
pub use room::RoomId;
pub use signaling::{IceServerConfig, SignalMessage, TrackInfo};
