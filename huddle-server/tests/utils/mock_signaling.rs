use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use huddle_core::{ParticipantId, RoomId, TrackInfo};
use huddle_server::SignalingOutput;
use tokio::sync::Mutex;

/// One captured outbound signal.
#[derive(Debug, Clone)]
pub enum OutboundSignal {
    Answer {
        participant: ParticipantId,
        sdp: String,
    },
    Offer {
        participant: ParticipantId,
        sdp: String,
    },
    Ice {
        participant: ParticipantId,
        candidate: String,
    },
    TrackInfo {
        participant: ParticipantId,
        transceiver: HashMap<String, TrackInfo>,
    },
    ParticipantJoined {
        participant: ParticipantId,
        joined: ParticipantId,
    },
    ParticipantLeft {
        participant: ParticipantId,
        left: ParticipantId,
    },
}

/// Mock SignalingOutput that captures everything the engine sends.
#[derive(Clone, Default)]
pub struct MockSignalingOutput {
    signals: Arc<Mutex<Vec<OutboundSignal>>>,
}

impl MockSignalingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<OutboundSignal> {
        self.signals.lock().await.clone()
    }

    /// First SDP answer captured for a participant.
    pub async fn answer_for(&self, participant: &ParticipantId) -> Option<String> {
        self.signals.lock().await.iter().find_map(|s| match s {
            OutboundSignal::Answer {
                participant: p,
                sdp,
            } if p == participant => Some(sdp.clone()),
            _ => None,
        })
    }

    pub async fn offers_for(&self, participant: &ParticipantId) -> Vec<String> {
        self.signals
            .lock()
            .await
            .iter()
            .filter_map(|s| match s {
                OutboundSignal::Offer {
                    participant: p,
                    sdp,
                } if p == participant => Some(sdp.clone()),
                _ => None,
            })
            .collect()
    }

    /// Poll until `predicate` matches a captured signal or the timeout
    /// elapses; returns whether it matched.
    pub async fn wait_for<F>(&self, timeout_ms: u64, predicate: F) -> bool
    where
        F: Fn(&OutboundSignal) -> bool,
    {
        let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            if self.signals.lock().await.iter().any(|s| predicate(s)) {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    }
}

#[async_trait]
impl SignalingOutput for MockSignalingOutput {
    async fn send_answer(&self, participant: ParticipantId, sdp: String) {
        tracing::debug!("[MockSignaling] send_answer to {participant}");
        self.signals
            .lock()
            .await
            .push(OutboundSignal::Answer { participant, sdp });
    }

    async fn send_offer(&self, participant: ParticipantId, _room: RoomId, sdp: String) {
        tracing::debug!("[MockSignaling] send_offer to {participant}");
        self.signals
            .lock()
            .await
            .push(OutboundSignal::Offer { participant, sdp });
    }

    async fn send_ice(&self, participant: ParticipantId, candidate: String) {
        self.signals.lock().await.push(OutboundSignal::Ice {
            participant,
            candidate,
        });
    }

    async fn send_track_info(
        &self,
        participant: ParticipantId,
        transceiver: HashMap<String, TrackInfo>,
    ) {
        self.signals.lock().await.push(OutboundSignal::TrackInfo {
            participant,
            transceiver,
        });
    }

    async fn send_participant_joined(
        &self,
        participant: ParticipantId,
        joined: ParticipantId,
        _room: RoomId,
    ) {
        self.signals
            .lock()
            .await
            .push(OutboundSignal::ParticipantJoined {
                participant,
                joined,
            });
    }

    async fn send_participant_left(
        &self,
        participant: ParticipantId,
        left: ParticipantId,
        _room: RoomId,
    ) {
        self.signals
            .lock()
            .await
            .push(OutboundSignal::ParticipantLeft { participant, left });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_signaling_captures_answer() {
        let signaling = MockSignalingOutput::new();
        let participant = ParticipantId::generate();
        let sdp = "test-sdp".to_string();

        signaling
            .send_answer(participant.clone(), sdp.clone())
            .await;

        assert_eq!(signaling.answer_for(&participant).await, Some(sdp));
        assert_eq!(signaling.all().await.len(), 1);
    }
}
