//! Bridge entry-point: loads configuration, builds the remote executor and
//! serves the SCIM endpoints.

mod server;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use scim_bridge::config::{BridgeConfig, BridgeSettings};
use scim_bridge::inbound::http::health::HealthState;
use server::{ServerConfig, create_server, drain_on, shutdown_signal};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = BridgeSettings::load()
        .map_err(|e| std::io::Error::other(format!("failed to load configuration: {e}")))?;
    let config = BridgeConfig::try_from(settings)
        .map_err(|e| std::io::Error::other(format!("invalid configuration: {e}")))?;
    info!(?config, "starting SCIM bridge");

    let server_config = ServerConfig::from_bridge(&config)?;
    info!(bind_addr = %server_config.bind_addr(), "listening");
    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), server_config)?;
    actix_web::rt::spawn(drain_on(shutdown_signal(), health_state, server.handle()));
    server.await
}
