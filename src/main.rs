mod config;
mod game;
mod net;
mod room;

use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing::{error, info, Level};

use crate::config::ServerConfig;
use crate::game::constants::{grid, tick};
use crate::net::gateway::SessionGateway;
use crate::net::transport;
use crate::room::registry::RoomRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    info!("Snake Arena Server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = ServerConfig::load_or_default();
    config.validate().map_err(anyhow::Error::msg)?;
    info!(
        "Configuration loaded: {}:{}, max_rooms={}, disconnect_policy={:?}",
        config.bind_address, config.port, config.max_rooms, config.disconnect_policy
    );
    info!(
        "Simulating {}x{} grids at {} Hz",
        grid::SIZE,
        grid::SIZE,
        tick::FRAME_RATE
    );

    // Initialize shared state
    let registry = Arc::new(RwLock::new(RoomRegistry::new(config.max_rooms, grid::SIZE)));
    let gateway = SessionGateway::new(registry.clone(), config.disconnect_policy);

    let listener = TcpListener::bind((config.bind_address, config.port)).await?;
    info!("Server ready on {}:{}", config.bind_address, config.port);

    // Shutdown signal handler
    let shutdown = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Shutdown signal received");
    };

    // Run server with graceful shutdown
    tokio::select! {
        result = transport::serve(listener, gateway) => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
        }
        _ = shutdown => {
            info!("Shutting down...");
        }
    }

    // Cleanup
    registry.write().await.teardown_all();
    info!("Server stopped");

    Ok(())
}
