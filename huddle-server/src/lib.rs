pub mod config;
pub mod peer;
pub mod room;
pub mod signaling;

pub use config::TransportConfig;
pub use peer::{EngineEvent, NegotiationState, PeerEntry, PeerRegistry, RegistryError};
pub use room::{Room, RoomCommand, RoomManager};
pub use signaling::{SignalingOutput, SignalingService, SignalingState, ws_handler};
