use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use huddle_core::{ParticipantId, RoomId};
use tokio::sync::{mpsc, oneshot};
use tracing::info;

use crate::config::TransportConfig;
use crate::peer::PeerRegistry;
use crate::room::room::Room;
use crate::room::room_command::RoomCommand;
use crate::signaling::SignalingOutput;

/// Directory of live rooms. Rooms spawn lazily on first use and their
/// entries disappear when the room empties, so the directory never holds
/// an empty room.
#[derive(Clone)]
pub struct RoomManager {
    rooms: Arc<DashMap<RoomId, mpsc::Sender<RoomCommand>>>,
    registry: PeerRegistry,
    signaling: Arc<dyn SignalingOutput>,
    config: TransportConfig,
}

impl RoomManager {
    pub fn new(
        registry: PeerRegistry,
        signaling: Arc<dyn SignalingOutput>,
        config: TransportConfig,
    ) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            registry,
            signaling,
            config,
        }
    }

    /// Sender for a room's command queue, spawning the room if it is not
    /// running. A sender whose room already shut down is replaced.
    pub fn room_sender(&self, room_id: &RoomId) -> mpsc::Sender<RoomCommand> {
        if let Some(sender) = self.rooms.get(room_id) {
            if !sender.is_closed() {
                return sender.clone();
            }
        }

        info!(room = %room_id, "creating room");
        let (tx, rx) = mpsc::channel(100);
        let room = Room::new(
            room_id.clone(),
            self.registry.clone(),
            Arc::clone(&self.signaling),
            self.config.clone(),
            rx,
        );

        let rooms = Arc::clone(&self.rooms);
        let id = room_id.clone();
        tokio::spawn(async move {
            room.run().await;
            rooms.remove(&id);
        });

        self.rooms.insert(room_id.clone(), tx.clone());
        tx
    }

    /// Whether the room currently exists. Only rooms with members do.
    pub fn is_active(&self, room_id: &RoomId) -> bool {
        self.rooms
            .get(room_id)
            .is_some_and(|sender| !sender.is_closed())
    }

    /// Snapshot of a room's member set; empty for unknown rooms.
    pub async fn members(&self, room_id: &RoomId) -> HashSet<ParticipantId> {
        let Some(sender) = self.rooms.get(room_id).map(|s| s.clone()) else {
            return HashSet::new();
        };
        let (reply, rx) = oneshot::channel();
        if sender.send(RoomCommand::Members { reply }).await.is_err() {
            return HashSet::new();
        }
        rx.await.unwrap_or_default()
    }
}
