//! Shared HTTP adapter state.
//!
//! Handlers receive this via `actix_web::web::Data`; everything remote sits
//! behind the single injected executor.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::RemoteCallExecutor;
use crate::domain::{GroupProvisioner, UserReconciler};
use crate::inbound::http::auth::SharedSecret;

/// Dependency bundle for provisioning handlers.
#[derive(Clone)]
pub struct HttpState {
    pub users: UserReconciler,
    pub groups: GroupProvisioner,
    pub clock: Arc<dyn Clock>,
    pub secret: SharedSecret,
    /// Normalised prefix, either empty or `/segment[/segment..]`.
    pub path_prefix: String,
}

impl HttpState {
    pub fn new(
        executor: Arc<dyn RemoteCallExecutor>,
        clock: Arc<dyn Clock>,
        secret: SharedSecret,
        path_prefix: impl Into<String>,
    ) -> Self {
        Self {
            users: UserReconciler::new(Arc::clone(&executor)),
            groups: GroupProvisioner::new(executor),
            clock,
            secret,
            path_prefix: path_prefix.into(),
        }
    }
}
