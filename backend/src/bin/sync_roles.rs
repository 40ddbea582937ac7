//! Upsert the management roles and assign them to their provisioned groups.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::io;
use std::sync::Arc;

use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use scim_bridge::config::{RoleSyncConfig, RoleSyncSettings};
use scim_bridge::domain::{RetryingExecutor, RoleSynchroniser, TokioSleeper};
use scim_bridge::outbound::graphql::GraphqlHttpTransport;

fn main() -> io::Result<()> {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = RoleSyncSettings::load()
        .map_err(|e| io::Error::other(format!("failed to load configuration: {e}")))?;
    let config = RoleSyncConfig::try_from(settings)
        .map_err(|e| io::Error::other(format!("invalid configuration: {e}")))?;
    info!(?config, "synchronising management roles");

    let transport = GraphqlHttpTransport::new(
        config.graphql_url.clone(),
        config.graphql_token.clone(),
        config.request_timeout,
    )
    .map_err(|e| io::Error::other(format!("failed to build GraphQL client: {e}")))?;
    let clock = Arc::new(DefaultClock);
    let executor = RetryingExecutor::new(Arc::new(transport), clock.clone(), config.retry);
    let synchroniser = RoleSynchroniser::new(
        Arc::new(executor),
        clock,
        Arc::new(TokioSleeper),
        config.group_wait,
    );

    let synced = synchroniser
        .sync_all(&config.grants)
        .await
        .map_err(|e| io::Error::other(format!("role sync failed: {e}")))?;
    for role in &synced {
        info!(
            role = %role.role_name,
            role_id = %role.role_id,
            group_id = %role.group_id,
            effect = ?role.effect,
            "role synchronised"
        );
    }
    Ok(())
}
