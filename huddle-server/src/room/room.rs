use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use huddle_core::{ParticipantId, RoomId, TrackInfo};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::TransportConfig;
use crate::peer::{self, EngineEvent, PeerEntry, PeerRegistry};
use crate::room::room_command::RoomCommand;
use crate::room::track_router::TrackRouter;
use crate::signaling::SignalingOutput;

/// One conference room: owns the member set and the track router, and
/// serializes every room-scoped mutation through its event loop. The loop
/// exits once the last member leaves; the manager then drops its entry.
pub struct Room {
    id: RoomId,
    members: HashSet<ParticipantId>,
    router: TrackRouter,
    registry: PeerRegistry,
    signaling: Arc<dyn SignalingOutput>,
    config: TransportConfig,
    command_rx: mpsc::Receiver<RoomCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    event_tx: mpsc::Sender<EngineEvent>,
    done: bool,
}

impl Room {
    pub fn new(
        id: RoomId,
        registry: PeerRegistry,
        signaling: Arc<dyn SignalingOutput>,
        config: TransportConfig,
        command_rx: mpsc::Receiver<RoomCommand>,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::channel(256);
        Self {
            id,
            members: HashSet::new(),
            router: TrackRouter::new(),
            registry,
            signaling,
            config,
            command_rx,
            event_rx,
            event_tx,
            done: false,
        }
    }

    pub async fn run(mut self) {
        info!(room = %self.id, "room event loop started");

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd).await,
                        None => break,
                    }
                }
                event = self.event_rx.recv() => {
                    // self holds an event_tx, so this arm never yields None
                    if let Some(event) = event {
                        self.handle_engine_event(event).await;
                    }
                }
            }

            if self.done {
                info!(room = %self.id, "last participant left, closing room");
                break;
            }
        }

        info!(room = %self.id, "room event loop finished");
    }

    async fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Offer { participant, sdp } => self.handle_offer(participant, sdp).await,
            RoomCommand::Answer { participant, sdp } => self.handle_answer(participant, sdp).await,
            RoomCommand::IceCandidate {
                participant,
                candidate,
            } => {
                let Some(entry) = self.registry.get(&participant) else {
                    debug!(%participant, "ICE for unknown participant dropped");
                    return;
                };
                if let Err(e) = peer::add_remote_candidate(&entry, &candidate).await {
                    warn!(%participant, error = ?e, "ICE candidate rejected");
                }
            }
            RoomCommand::TrackMetadata {
                participant,
                transceiver,
            } => self.handle_track_metadata(participant, transceiver).await,
            RoomCommand::Join { participant } => self.handle_join(participant).await,
            RoomCommand::Negotiate { participant } => {
                let Some(entry) = self.registry.get(&participant) else {
                    debug!(%participant, "negotiation request for unknown participant dropped");
                    return;
                };
                peer::schedule_negotiation(
                    entry,
                    Arc::clone(&self.signaling),
                    self.config.negotiation_debounce,
                )
                .await;
            }
            RoomCommand::Leave { participant } | RoomCommand::Disconnect { participant } => {
                self.remove_participant(&participant).await;
            }
            RoomCommand::Members { reply } => {
                let _ = reply.send(self.members.clone());
            }
        }
    }

    async fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::TrackArrived {
                participant,
                mid,
                kind,
                track,
            } => {
                if let Some((stream_type, kind, track)) =
                    self.router.track_received(&participant, mid.clone(), kind, track)
                {
                    self.router
                        .publish(
                            &self.registry,
                            &self.members,
                            &participant,
                            mid,
                            stream_type,
                            kind,
                            track,
                        )
                        .await;
                }
            }
            EngineEvent::TrackEnded { participant, mid } => {
                if let Some((stream_type, kind)) = self.router.track_ended(&participant, &mid) {
                    debug!(%participant, ?stream_type, ?kind, "live track ended");
                }
            }
            EngineEvent::Disconnected { participant } => {
                self.remove_participant(&participant).await;
            }
        }
    }

    /// First offer creates the connection and membership; later offers
    /// renegotiate the existing connection.
    async fn handle_offer(&mut self, participant: ParticipantId, sdp: String) {
        let entry = match self.ensure_entry(&participant).await {
            Ok(entry) => entry,
            Err(e) => {
                error!(%participant, error = ?e, "creating peer connection failed");
                return;
            }
        };

        if let Err(e) = peer::apply_remote_offer(&entry, &sdp, &self.signaling).await {
            warn!(%participant, error = ?e, "client offer abandoned");
            return;
        }

        self.admit(participant).await;
    }

    /// Completed renegotiation: apply the answer, then tell the viewer
    /// which mid belongs to whom.
    async fn handle_answer(&mut self, participant: ParticipantId, sdp: String) {
        let Some(entry) = self.registry.get(&participant) else {
            debug!(%participant, "answer for unknown participant dropped");
            return;
        };
        match peer::apply_remote_answer(&entry, &sdp).await {
            Ok(true) => {
                let announced = self.router.unannounced_mids(&participant);
                if !announced.is_empty() {
                    self.signaling.send_track_info(participant, announced).await;
                }
            }
            Ok(false) => {}
            Err(e) => warn!(%participant, error = ?e, "client answer abandoned"),
        }
    }

    async fn handle_track_metadata(
        &mut self,
        participant: ParticipantId,
        transceiver: HashMap<String, TrackInfo>,
    ) {
        for (mid, info) in transceiver {
            if let Some((stream_type, kind, track)) =
                self.router
                    .metadata_received(&participant, mid.clone(), info.stream_type)
            {
                self.router
                    .publish(
                        &self.registry,
                        &self.members,
                        &participant,
                        mid,
                        stream_type,
                        kind,
                        track,
                    )
                    .await;
            }
        }
    }

    /// Join without an offer: wiring the room's existing tracks into the
    /// fresh connection raises negotiation-needed, which debounces into
    /// the server's first offer.
    async fn handle_join(&mut self, participant: ParticipantId) {
        if let Err(e) = self.ensure_entry(&participant).await {
            error!(%participant, error = ?e, "creating peer connection failed");
            return;
        }
        self.admit(participant).await;
    }

    /// Idempotent membership: announce and wire only on first admission.
    async fn admit(&mut self, participant: ParticipantId) {
        if !self.members.insert(participant.clone()) {
            return;
        }
        info!(room = %self.id, %participant, "participant joined");

        for member in &self.members {
            if member != &participant {
                self.signaling
                    .send_participant_joined(member.clone(), participant.clone(), self.id.clone())
                    .await;
            }
        }

        self.router
            .attach_existing(&self.registry, &self.members, &participant)
            .await;
    }

    async fn ensure_entry(&mut self, participant: &ParticipantId) -> anyhow::Result<Arc<PeerEntry>> {
        if let Some(entry) = self.registry.get(participant) {
            // a participant is in at most one room; this is upstream's
            // contract, so only flag the violation
            if entry.room != self.id {
                warn!(%participant, expected = %self.id, actual = %entry.room, "peer connection belongs to another room");
            }
            return Ok(entry);
        }
        let connection = peer::create_peer_connection(&self.config).await?;
        let entry = self.registry.create(PeerEntry::new(
            participant.clone(),
            self.id.clone(),
            connection,
        ))?;
        peer::wire_callbacks(
            &entry,
            &self.config,
            Arc::clone(&self.signaling),
            self.event_tx.clone(),
        );
        Ok(entry)
    }

    /// LEAVE and transport death share this path; running it twice for the
    /// same participant is safe.
    async fn remove_participant(&mut self, participant: &ParticipantId) {
        let was_member = self.members.remove(participant);
        self.router.remove_participant(participant).await;
        self.registry.remove(participant).await;

        if was_member {
            info!(room = %self.id, %participant, "participant left");
            for member in &self.members {
                self.signaling
                    .send_participant_left(member.clone(), participant.clone(), self.id.clone())
                    .await;
            }
        }

        // any departure that leaves the room empty retires it, so the
        // directory never holds an empty room
        if self.members.is_empty() {
            self.done = true;
        }
    }
}
