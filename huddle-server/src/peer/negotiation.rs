use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, warn};
use webrtc::ice_transport::ice_candidate::RTCIceCandidateInit;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::signaling_state::RTCSignalingState;

use crate::peer::entry::{NegotiationState, PeerEntry};
use crate::signaling::SignalingOutput;

/// Apply a client offer and send back the answer. Client offers are always
/// accepted: the server is the only other offerer, so a collision surfaces
/// as an engine error here, which abandons this attempt and lets the next
/// negotiation-needed signal retry.
pub async fn apply_remote_offer(
    entry: &Arc<PeerEntry>,
    sdp: &str,
    signaling: &Arc<dyn SignalingOutput>,
) -> Result<()> {
    let desc: RTCSessionDescription = serde_json::from_str(sdp)?;
    let mut state = entry.negotiation.lock().await;

    entry.connection.set_remote_description(desc).await?;
    state.remote_set = true;
    flush_ice_queue(entry, &mut state).await;

    let answer = entry.connection.create_answer(None).await?;
    entry.connection.set_local_description(answer.clone()).await?;
    state.making_offer = false;
    drop(state);

    signaling
        .send_answer(entry.participant.clone(), serde_json::to_string(&answer)?)
        .await;
    Ok(())
}

/// Apply a client answer, unless it is stale. An answer arriving while no
/// local offer is outstanding belongs to a superseded negotiation and must
/// not disturb the current one. Returns whether the answer was applied.
pub async fn apply_remote_answer(entry: &Arc<PeerEntry>, sdp: &str) -> Result<bool> {
    let mut state = entry.negotiation.lock().await;
    if entry.connection.signaling_state() != RTCSignalingState::HaveLocalOffer {
        debug!(
            participant = %entry.participant,
            state = ?entry.connection.signaling_state(),
            "stale answer dropped"
        );
        return Ok(false);
    }

    let desc: RTCSessionDescription = serde_json::from_str(sdp)?;
    entry.connection.set_remote_description(desc).await?;
    state.remote_set = true;
    flush_ice_queue(entry, &mut state).await;
    state.making_offer = false;
    Ok(true)
}

/// Inbound trickle candidate: queued while no remote description exists,
/// applied directly afterwards.
pub async fn add_remote_candidate(entry: &Arc<PeerEntry>, ice: &str) -> Result<()> {
    let candidate: RTCIceCandidateInit = serde_json::from_str(ice)?;
    let mut state = entry.negotiation.lock().await;
    if !state.remote_set {
        state.ice_queue.push(candidate);
        debug!(
            participant = %entry.participant,
            queued = state.ice_queue.len(),
            "ICE candidate queued until remote description"
        );
        return Ok(());
    }
    entry.connection.add_ice_candidate(candidate).await?;
    Ok(())
}

/// Drain queued candidates in arrival order. Runs with the state lock held,
/// so a candidate racing the `remote_set` flip lands either in this drain
/// or on the direct-apply path, never both and never nowhere.
async fn flush_ice_queue(entry: &Arc<PeerEntry>, state: &mut NegotiationState) {
    for candidate in state.ice_queue.drain(..) {
        if let Err(e) = entry.connection.add_ice_candidate(candidate).await {
            warn!(participant = %entry.participant, error = ?e, "queued ICE candidate rejected");
        }
    }
}

/// Debounced renegotiation: every negotiation-needed signal restarts the
/// timer, so a burst of transceiver changes produces a single offer.
pub async fn schedule_negotiation(
    entry: Arc<PeerEntry>,
    signaling: Arc<dyn SignalingOutput>,
    debounce: Duration,
) {
    let fire = {
        let entry = Arc::clone(&entry);
        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if let Err(e) = negotiate(&entry, &signaling).await {
                warn!(participant = %entry.participant, error = ?e, "renegotiation attempt failed");
            }
        })
    };
    entry.arm_negotiation_timer(fire).await;
}

/// Create and send an offer if the connection is quiet. Skipped when a
/// negotiation is already in flight either way; the engine raises
/// negotiation-needed again once it returns to stable with changes still
/// pending.
pub async fn negotiate(entry: &Arc<PeerEntry>, signaling: &Arc<dyn SignalingOutput>) -> Result<()> {
    let mut state = entry.negotiation.lock().await;
    if entry.connection.signaling_state() != RTCSignalingState::Stable || state.making_offer {
        debug!(participant = %entry.participant, "negotiation already in flight, offer skipped");
        return Ok(());
    }
    state.making_offer = true;
    state.remote_set = false;

    let offer = match entry.connection.create_offer(None).await {
        Ok(offer) => offer,
        Err(e) => {
            state.making_offer = false;
            return Err(e.into());
        }
    };
    if let Err(e) = entry.connection.set_local_description(offer.clone()).await {
        state.making_offer = false;
        return Err(e.into());
    }
    drop(state);

    signaling
        .send_offer(
            entry.participant.clone(),
            entry.room.clone(),
            serde_json::to_string(&offer)?,
        )
        .await;
    Ok(())
}
