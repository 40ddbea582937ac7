//! Driving contract for issuing operations against the remote identity graph.
//!
//! Domain services only ever see this port. The retry budget, the wire codec
//! and the credential live behind it.

use async_trait::async_trait;
use serde_json::Value;

use super::define_port_error;
use crate::domain::RemoteOperation;

define_port_error! {
    /// Failure classes reported by the remote identity graph.
    pub enum RemoteCallError {
        /// The remote understood the request and rejected it. Never retried.
        Query { message: String } =>
            "remote rejected the operation: {message}",
        /// The request did not complete: connection failure, timeout or a
        /// transient server status.
        Transport { message: String } =>
            "remote transport failed: {message}",
        /// The remote answered with a payload that does not match the
        /// operation's result shape.
        Unexpected { message: String } =>
            "unexpected remote response: {message}",
    }
}

impl RemoteCallError {
    /// Return whether repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Stable label used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Query { .. } => "query",
            Self::Transport { .. } => "transport",
            Self::Unexpected { .. } => "unexpected",
        }
    }
}

/// Executes one named operation with its variables and returns the `data`
/// object of the remote response.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteCallExecutor: Send + Sync {
    /// Run `operation` to completion, retrying transient failures within the
    /// executor's time budget.
    async fn execute(
        &self,
        operation: RemoteOperation,
        variables: Value,
    ) -> Result<Value, RemoteCallError>;
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(RemoteCallError::transport("reset"), true)]
    #[case(RemoteCallError::query("no such group"), false)]
    #[case(RemoteCallError::unexpected("missing data"), false)]
    fn only_transport_failures_are_retryable(
        #[case] error: RemoteCallError,
        #[case] expected: bool,
    ) {
        assert_eq!(error.is_retryable(), expected);
    }

    #[test]
    fn query_errors_render_remote_message() {
        let error = RemoteCallError::query("Group not found");
        assert_eq!(
            error.to_string(),
            "remote rejected the operation: Group not found"
        );
        assert_eq!(error.kind(), "query");
    }
}
