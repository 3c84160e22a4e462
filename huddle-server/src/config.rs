use std::time::Duration;

/// WebRTC engine configuration shared by every peer connection.
#[derive(Clone)]
pub struct TransportConfig {
    /// STUN/TURN URLs handed to the ICE agent.
    pub ice_servers: Vec<String>,
    /// Quiet window that coalesces bursts of negotiation-needed signals
    /// into a single offer.
    pub negotiation_debounce: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec!["stun:stun.l.google.com:19302".to_owned()],
            negotiation_debounce: Duration::from_millis(100),
        }
    }
}
