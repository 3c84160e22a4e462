use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use huddle_core::{MediaKind, MediaSlots, ParticipantId, StreamType, TrackInfo};
use tracing::{debug, warn};
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_rtp::TrackLocalStaticRTP;

use crate::peer::{PeerEntry, PeerRegistry};

/// Sender-side transceiver forwarding one owner slot to one viewer.
pub(crate) struct Binding {
    transceiver: Arc<RTCRtpTransceiver>,
    announced: bool,
}

/// Half of a pending reconciliation: whichever of the raw track and its
/// ownership metadata arrives first waits here for the other.
enum PendingTrack {
    Metadata(StreamType),
    Track {
        kind: MediaKind,
        track: Arc<TrackLocalStaticRTP>,
    },
}

/// Routes media between room members: records each participant's live
/// tracks, owns the `(viewer, owner)` transceiver bindings, and wires new
/// tracks and new members to each other. Only ever touched from the
/// owning room's event loop.
#[derive(Default)]
pub struct TrackRouter {
    media: HashMap<ParticipantId, MediaSlots<Arc<TrackLocalStaticRTP>>>,
    /// Keyed `(viewer, owner)`; the transceivers live on the viewer's connection.
    bindings: HashMap<(ParticipantId, ParticipantId), MediaSlots<Binding>>,
    /// Keyed `(owner, mid)`: unreconciled halves of published lines.
    pending: HashMap<(ParticipantId, String), PendingTrack>,
    /// Keyed `(owner, mid)`: slot occupied by each published line, for teardown.
    published: HashMap<(ParticipantId, String), (StreamType, MediaKind, Arc<TrackLocalStaticRTP>)>,
}

impl TrackRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile the metadata half of one published line. Returns the
    /// publish that is now complete, if the raw track already arrived.
    pub fn metadata_received(
        &mut self,
        owner: &ParticipantId,
        mid: String,
        stream_type: StreamType,
    ) -> Option<(StreamType, MediaKind, Arc<TrackLocalStaticRTP>)> {
        match self.pending.remove(&(owner.clone(), mid.clone())) {
            Some(PendingTrack::Track { kind, track }) => Some((stream_type, kind, track)),
            Some(PendingTrack::Metadata(_)) | None => {
                self.pending
                    .insert((owner.clone(), mid), PendingTrack::Metadata(stream_type));
                None
            }
        }
    }

    /// Reconcile the raw-track half (from the engine's track event).
    pub fn track_received(
        &mut self,
        owner: &ParticipantId,
        mid: String,
        kind: MediaKind,
        track: Arc<TrackLocalStaticRTP>,
    ) -> Option<(StreamType, MediaKind, Arc<TrackLocalStaticRTP>)> {
        match self.pending.remove(&(owner.clone(), mid.clone())) {
            Some(PendingTrack::Metadata(stream_type)) => Some((stream_type, kind, track)),
            Some(PendingTrack::Track { .. }) | None => {
                self.pending
                    .insert((owner.clone(), mid), PendingTrack::Track { kind, track });
                None
            }
        }
    }

    /// Record a reconciled track in its owner's slot and attach it to
    /// every other member's connection.
    #[allow(clippy::too_many_arguments)]
    pub async fn publish(
        &mut self,
        registry: &PeerRegistry,
        members: &HashSet<ParticipantId>,
        owner: &ParticipantId,
        mid: String,
        stream_type: StreamType,
        kind: MediaKind,
        track: Arc<TrackLocalStaticRTP>,
    ) {
        let replaced = self
            .media
            .entry(owner.clone())
            .or_default()
            .set(stream_type, kind, Arc::clone(&track));
        if replaced.is_some() {
            debug!(%owner, ?stream_type, ?kind, "live track replaced");
        }
        self.published
            .insert((owner.clone(), mid), (stream_type, kind, Arc::clone(&track)));

        for viewer in members {
            if viewer == owner {
                continue;
            }
            let Some(entry) = registry.get(viewer) else {
                debug!(%viewer, "room member without a peer connection, fan-out skipped");
                continue;
            };
            if let Err(e) = self
                .attach(&entry, viewer, owner, stream_type, kind, &track)
                .await
            {
                warn!(%owner, %viewer, error = ?e, "attaching track to viewer failed");
            }
        }
    }

    /// Wire a fresh member's connection with every live track already in
    /// the room.
    pub async fn attach_existing(
        &mut self,
        registry: &PeerRegistry,
        members: &HashSet<ParticipantId>,
        viewer: &ParticipantId,
    ) {
        let Some(entry) = registry.get(viewer) else {
            debug!(%viewer, "new member without a peer connection, wiring skipped");
            return;
        };

        let existing: Vec<(ParticipantId, StreamType, MediaKind, Arc<TrackLocalStaticRTP>)> =
            members
                .iter()
                .filter(|owner| *owner != viewer)
                .flat_map(|owner| {
                    self.media.get(owner).into_iter().flat_map(move |slots| {
                        slots
                            .iter()
                            .map(move |(s, k, t)| (owner.clone(), s, k, Arc::clone(t)))
                    })
                })
                .collect();

        for (owner, stream_type, kind, track) in existing {
            if let Err(e) = self
                .attach(&entry, viewer, &owner, stream_type, kind, &track)
                .await
            {
                warn!(%owner, %viewer, error = ?e, "wiring existing track failed");
            }
        }
    }

    /// Get or create the sender-only transceiver for one directed edge and
    /// put the track on it. An existing binding is reused via
    /// `replace_track`; transceivers are negotiation-affecting, so an edge
    /// never grows a second one for the same slot.
    async fn attach(
        &mut self,
        entry: &Arc<PeerEntry>,
        viewer: &ParticipantId,
        owner: &ParticipantId,
        stream_type: StreamType,
        kind: MediaKind,
        track: &Arc<TrackLocalStaticRTP>,
    ) -> anyhow::Result<()> {
        let slots = self
            .bindings
            .entry((viewer.clone(), owner.clone()))
            .or_default();

        if let Some(binding) = slots.get(stream_type, kind) {
            binding
                .transceiver
                .sender()
                .await
                .replace_track(Some(Arc::clone(track) as Arc<dyn TrackLocal + Send + Sync>))
                .await?;
            return Ok(());
        }

        let transceiver = entry
            .connection
            .add_transceiver_from_track(
                Arc::clone(track) as Arc<dyn TrackLocal + Send + Sync>,
                Some(RTCRtpTransceiverInit {
                    direction: RTCRtpTransceiverDirection::Sendonly,
                    send_encodings: vec![],
                }),
            )
            .await?;
        slots.set(
            stream_type,
            kind,
            Binding {
                transceiver,
                announced: false,
            },
        );
        Ok(())
    }

    /// Collect the not-yet-announced mids negotiated toward one viewer,
    /// marking them announced. Feeds the TRACK message that follows a
    /// completed renegotiation.
    pub fn unannounced_mids(&mut self, viewer: &ParticipantId) -> HashMap<String, TrackInfo> {
        let mut announced = HashMap::new();
        for ((bound_viewer, owner), slots) in self.bindings.iter_mut() {
            if bound_viewer != viewer {
                continue;
            }
            for (stream_type, _kind, binding) in slots.iter_mut() {
                if binding.announced {
                    continue;
                }
                let Some(mid) = binding.transceiver.mid() else {
                    continue;
                };
                binding.announced = true;
                announced.insert(
                    mid.to_string(),
                    TrackInfo {
                        user_id: Some(owner.clone()),
                        stream_type,
                    },
                );
            }
        }
        announced
    }

    /// A forwarded track's pump ended: clear the owner's slot unless a
    /// replacement already took it. Transceivers stay put for reuse.
    pub fn track_ended(
        &mut self,
        owner: &ParticipantId,
        mid: &str,
    ) -> Option<(StreamType, MediaKind)> {
        self.pending.remove(&(owner.clone(), mid.to_owned()));
        let (stream_type, kind, ended) = self.published.remove(&(owner.clone(), mid.to_owned()))?;
        let slots = self.media.get_mut(owner)?;
        if slots
            .get(stream_type, kind)
            .is_some_and(|current| Arc::ptr_eq(current, &ended))
        {
            slots.take(stream_type, kind);
            return Some((stream_type, kind));
        }
        None
    }

    /// Tear down everything that names a departing participant: its own
    /// slots and pending halves, the bindings on its connection, and on
    /// every surviving viewer the bindings that forwarded its tracks.
    /// Surviving bindings are flipped inactive rather than removed, since
    /// removal would churn m-lines mid-session.
    pub async fn remove_participant(&mut self, leaver: &ParticipantId) {
        self.media.remove(leaver);
        self.pending.retain(|(owner, _), _| owner != leaver);
        self.published.retain(|(owner, _), _| owner != leaver);

        let edges: Vec<(ParticipantId, ParticipantId)> = self
            .bindings
            .keys()
            .filter(|(viewer, owner)| viewer == leaver || owner == leaver)
            .cloned()
            .collect();

        for edge in edges {
            let Some(slots) = self.bindings.remove(&edge) else {
                continue;
            };
            let (viewer, _owner) = &edge;
            if viewer == leaver {
                // Bindings on the leaver's own connection die with it.
                continue;
            }
            for (_stream_type, _kind, binding) in slots.iter() {
                binding
                    .transceiver
                    .set_direction(RTCRtpTransceiverDirection::Inactive)
                    .await;
                if let Err(e) = binding.transceiver.sender().await.replace_track(None).await {
                    debug!(error = ?e, "detaching forwarded track failed");
                }
            }
        }
    }
}
