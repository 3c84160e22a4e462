use anyhow::{Context, Result};
use huddle_server::RoomCommand;
use tokio::sync::mpsc;

use super::mock_signaling::{MockSignalingOutput, OutboundSignal};
use super::test_client::TestClient;

/// Timeout for signal exchange operations (ms).
pub const SIGNAL_TIMEOUT_MS: u64 = 5000;

/// Drive a full join: client offer in, room answer out and applied.
pub async fn perform_join(
    client: &TestClient,
    cmd_tx: &mpsc::Sender<RoomCommand>,
    signaling: &MockSignalingOutput,
) -> Result<()> {
    let participant = client.participant.clone();

    let offer = client.create_offer().await.context("creating offer")?;
    cmd_tx
        .send(RoomCommand::Offer {
            participant: participant.clone(),
            sdp: offer,
        })
        .await
        .context("sending offer command")?;

    let answered = signaling
        .wait_for(SIGNAL_TIMEOUT_MS, |s| {
            matches!(s, OutboundSignal::Answer { participant: p, .. } if *p == participant)
        })
        .await;
    anyhow::ensure!(answered, "no answer for {participant}");

    let answer = signaling
        .answer_for(&participant)
        .await
        .expect("answer just observed");
    client
        .set_remote_answer(answer)
        .await
        .context("applying answer")?;
    Ok(())
}
