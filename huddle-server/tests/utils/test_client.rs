use std::sync::Arc;

use anyhow::Result;
use huddle_core::ParticipantId;
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MediaEngine};
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_rtp::TrackLocalStaticRTP;

/// Minimal conferencing client: a real peer connection that can publish
/// media lines and complete offer/answer exchanges against a room. No ICE
/// servers are configured, so tests stay off the network.
pub struct TestClient {
    pub participant: ParticipantId,
    pub connection: Arc<RTCPeerConnection>,
}

impl TestClient {
    pub async fn new(participant: ParticipantId) -> Result<Self> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;
        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();
        let connection = Arc::new(api.new_peer_connection(RTCConfiguration::default()).await?);
        Ok(Self {
            participant,
            connection,
        })
    }

    /// Add a sendonly media line backed by a static RTP track, as a
    /// publishing client would.
    pub async fn publish_kind(&self, kind: RTPCodecType) -> Result<()> {
        let capability = match kind {
            RTPCodecType::Video => RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                clock_rate: 90000,
                ..Default::default()
            },
            _ => RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: 48000,
                channels: 2,
                ..Default::default()
            },
        };
        let track = Arc::new(TrackLocalStaticRTP::new(
            capability,
            format!("{}-{kind}", self.participant),
            self.participant.to_string(),
        ));
        self.connection
            .add_transceiver_from_track(
                track as Arc<dyn TrackLocal + Send + Sync>,
                Some(RTCRtpTransceiverInit {
                    direction: RTCRtpTransceiverDirection::Sendonly,
                    send_encodings: vec![],
                }),
            )
            .await?;
        Ok(())
    }

    /// Create a local offer and return it JSON-serialized, ready for the
    /// OFFER payload.
    pub async fn create_offer(&self) -> Result<String> {
        let offer = self.connection.create_offer(None).await?;
        self.connection.set_local_description(offer.clone()).await?;
        Ok(serde_json::to_string(&offer)?)
    }

    /// Apply the server's JSON-serialized answer.
    pub async fn set_remote_answer(&self, sdp: String) -> Result<()> {
        let answer: RTCSessionDescription = serde_json::from_str(&sdp)?;
        self.connection.set_remote_description(answer).await?;
        Ok(())
    }

    pub async fn close(&self) -> Result<()> {
        self.connection.close().await?;
        Ok(())
    }
}
