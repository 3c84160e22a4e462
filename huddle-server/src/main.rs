use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::routing::get;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use huddle_core::IceServerConfig;
use huddle_server::signaling::{SignalingService, SignalingState, ws_handler};
use huddle_server::{PeerRegistry, RoomManager, TransportConfig};

/// Signaling and media-routing server for huddle conferences.
#[derive(Parser)]
#[command(name = "huddle-server")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:8080")]
    listen: SocketAddr,

    /// STUN server URL handed to every peer connection.
    #[arg(long, default_value = "stun:stun.l.google.com:19302")]
    stun: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "huddle_server=info,webrtc=warn".into()),
        )
        .init();

    let args = Args::parse();

    let config = TransportConfig {
        ice_servers: vec![args.stun.clone()],
        ..Default::default()
    };
    let service = SignalingService::new(vec![IceServerConfig {
        urls: vec![args.stun],
        username: None,
        credential: None,
    }]);
    let registry = PeerRegistry::new();
    let rooms = RoomManager::new(registry, Arc::new(service.clone()), config);

    let state = SignalingState { service, rooms };
    let app = Router::new()
        .route("/rooms/{room_id}/ws/{user_id}", get(ws_handler))
        .with_state(state);

    info!(listen = %args.listen, "huddle server listening");
    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
