use std::sync::Arc;

use anyhow::Result;
use huddle_core::MediaKind;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::RTCIceCandidate;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::track::track_local::TrackLocalWriter;
use webrtc::track::track_local::track_local_static_rtp::TrackLocalStaticRTP;

use crate::config::TransportConfig;
use crate::peer::engine_event::EngineEvent;
use crate::peer::entry::PeerEntry;
use crate::peer::negotiation;
use crate::signaling::SignalingOutput;

/// Build a server-side peer connection with the shared media-engine and
/// interceptor setup.
pub async fn create_peer_connection(config: &TransportConfig) -> Result<Arc<RTCPeerConnection>> {
    let mut media_engine = MediaEngine::default();
    media_engine.register_default_codecs()?;
    let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

    let api = APIBuilder::new()
        .with_media_engine(media_engine)
        .with_interceptor_registry(registry)
        .build();

    let rtc_config = RTCConfiguration {
        ice_servers: vec![RTCIceServer {
            urls: config.ice_servers.clone(),
            ..Default::default()
        }],
        ..Default::default()
    };

    Ok(Arc::new(api.new_peer_connection(rtc_config).await?))
}

/// Attach the engine callbacks for one participant: trickle ICE out,
/// debounced renegotiation, inbound track capture, and terminal-state
/// cleanup. Room-scoped events go through `event_tx`; per-participant work
/// runs directly against the entry under its own lock.
pub fn wire_callbacks(
    entry: &Arc<PeerEntry>,
    config: &TransportConfig,
    signaling: Arc<dyn SignalingOutput>,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let pc = &entry.connection;

    // Locally gathered candidates are proxied out as soon as they appear;
    // only inbound candidates wait for the remote description.
    let ice_entry = Arc::clone(entry);
    let ice_signaling = Arc::clone(&signaling);
    pc.on_ice_candidate(Box::new(move |candidate: Option<RTCIceCandidate>| {
        let entry = Arc::clone(&ice_entry);
        let signaling = Arc::clone(&ice_signaling);
        Box::pin(async move {
            let Some(candidate) = candidate else { return };
            let init = match candidate.to_json() {
                Ok(init) => init,
                Err(e) => {
                    warn!(participant = %entry.participant, error = ?e, "serializing ICE candidate failed");
                    return;
                }
            };
            let Ok(json) = serde_json::to_string(&init) else {
                return;
            };
            signaling.send_ice(entry.participant.clone(), json).await;
        })
    }));

    let nego_entry = Arc::clone(entry);
    let nego_signaling = Arc::clone(&signaling);
    let debounce = config.negotiation_debounce;
    pc.on_negotiation_needed(Box::new(move || {
        let entry = Arc::clone(&nego_entry);
        let signaling = Arc::clone(&nego_signaling);
        Box::pin(async move {
            negotiation::schedule_negotiation(entry, signaling, debounce).await;
        })
    }));

    let track_entry = Arc::clone(entry);
    let track_tx = event_tx.clone();
    pc.on_track(Box::new(move |track, _receiver, transceiver| {
        let entry = Arc::clone(&track_entry);
        let event_tx = track_tx.clone();
        Box::pin(async move {
            let Some(mid) = transceiver.mid() else {
                warn!(participant = %entry.participant, "inbound track without a mid ignored");
                return;
            };
            let mid = mid.to_string();
            let kind = match track.kind() {
                RTPCodecType::Audio => MediaKind::Audio,
                RTPCodecType::Video => MediaKind::Video,
                _ => return,
            };
            let participant = entry.participant.clone();
            info!(%participant, %mid, ?kind, "inbound track");

            // Forwardable copy: one local track per published line, fanned
            // out to every viewer transceiver by the room.
            let forward = Arc::new(TrackLocalStaticRTP::new(
                track.codec().capability.clone(),
                format!("{participant}-{mid}"),
                participant.to_string(),
            ));

            let pump_track = Arc::clone(&forward);
            let pump_tx = event_tx.clone();
            let pump_participant = participant.clone();
            let pump_mid = mid.clone();
            tokio::spawn(async move {
                while let Ok((packet, _)) = track.read_rtp().await {
                    if let Err(e) = pump_track.write_rtp(&packet).await {
                        debug!(participant = %pump_participant, error = ?e, "forwarding RTP packet failed");
                    }
                }
                let _ = pump_tx
                    .send(EngineEvent::TrackEnded {
                        participant: pump_participant,
                        mid: pump_mid,
                    })
                    .await;
            });

            let _ = event_tx
                .send(EngineEvent::TrackArrived {
                    participant,
                    mid,
                    kind,
                    track: forward,
                })
                .await;
        })
    }));

    let state_tx = event_tx;
    let state_participant = entry.participant.clone();
    pc.on_peer_connection_state_change(Box::new(move |state: RTCPeerConnectionState| {
        let event_tx = state_tx.clone();
        let participant = state_participant.clone();
        Box::pin(async move {
            info!(%participant, ?state, "peer connection state changed");
            match state {
                RTCPeerConnectionState::Failed
                | RTCPeerConnectionState::Disconnected
                | RTCPeerConnectionState::Closed => {
                    let _ = event_tx.send(EngineEvent::Disconnected { participant }).await;
                }
                _ => {}
            }
        })
    }));
}
