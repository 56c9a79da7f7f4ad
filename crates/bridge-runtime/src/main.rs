//! # MCP HTTP Bridge Runtime
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry (stderr, env-driven filter)
//! 2. Load configuration from the environment
//! 3. Refuse to run without an enabled transport
//! 4. Build the bridge and connect the reference engine
//! 5. Start serving, wait for Ctrl+C, drain and stop

use std::sync::Arc;

use anyhow::{Context, Result};
use bridge_runtime::{load_config, PingEngine};
use bridge_telemetry::{init_telemetry, TelemetryConfig};
use http_bridge::{HttpBridge, ServerTransport};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry = TelemetryConfig::from_env();
    init_telemetry(&telemetry).context("Failed to initialize telemetry")?;

    let config = load_config();
    if !config.http.enabled {
        error!("No transport enabled. Set USE_HTTP to anything but 'false'.");
        std::process::exit(1);
    }

    let bridge = Arc::new(HttpBridge::new(config).context("Invalid bridge configuration")?);
    let transport: Arc<dyn ServerTransport> = bridge.clone();
    let subscription = PingEngine::connect(&transport);

    let addr = bridge.start().await.context("Failed to start HTTP bridge")?;
    info!(addr = %addr, "MCP HTTP bridge is running. Press Ctrl+C to stop.");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Initiating graceful shutdown...");
    bridge.stop().await.context("Failed to stop HTTP bridge")?;
    transport.detach(&subscription);

    info!("Shutdown complete");
    Ok(())
}
