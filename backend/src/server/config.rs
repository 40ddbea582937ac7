//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::sync::Arc;

use mockable::DefaultClock;
use scim_bridge::config::BridgeConfig;
use scim_bridge::domain::RetryingExecutor;
use scim_bridge::domain::ports::RemoteCallExecutor;
use scim_bridge::inbound::http::auth::SharedSecret;
use scim_bridge::outbound::graphql::GraphqlHttpTransport;

/// Everything the server needs, with the remote executor already built.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) path_prefix: String,
    pub(crate) secret: SharedSecret,
    pub(crate) executor: Arc<dyn RemoteCallExecutor>,
}

impl ServerConfig {
    /// Build the GraphQL transport and the retrying executor around it.
    ///
    /// # Errors
    /// Returns [`std::io::Error`] when the HTTP client cannot be constructed.
    pub fn from_bridge(config: &BridgeConfig) -> std::io::Result<Self> {
        let transport = GraphqlHttpTransport::new(
            config.graphql_url.clone(),
            config.graphql_token.clone(),
            config.request_timeout,
        )
        .map_err(|e| std::io::Error::other(format!("failed to build GraphQL client: {e}")))?;
        let executor =
            RetryingExecutor::new(Arc::new(transport), Arc::new(DefaultClock), config.retry);
        Ok(Self {
            bind_addr: config.bind_addr,
            path_prefix: config.path_prefix.clone(),
            secret: SharedSecret::new(&config.scim_token),
            executor: Arc::new(executor),
        })
    }

    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
