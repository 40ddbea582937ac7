//! Driven port for a single GraphQL round-trip.
//!
//! One call is one attempt. Retrying belongs to
//! [`crate::domain::RetryingExecutor`].

use async_trait::async_trait;
use serde_json::Value;

use super::RemoteCallError;
use crate::domain::RemoteOperation;

/// Sends one operation document with its variables to the remote graph.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GraphTransport: Send + Sync {
    /// Perform exactly one request and classify the outcome.
    async fn send(
        &self,
        operation: RemoteOperation,
        variables: &Value,
    ) -> Result<Value, RemoteCallError>;
}
