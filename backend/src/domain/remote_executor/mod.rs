//! Retrying executor for remote identity graph operations.
//!
//! Transient transport failures are retried at a fixed interval until the
//! next attempt would fall outside the retry budget. Each attempt is also cut
//! off once the remaining budget (at least one interval) runs out, so a
//! caller waits no longer than the budget plus one interval. Query rejections
//! and malformed responses surface on the first occurrence.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::RemoteOperation;
use crate::domain::ports::{GraphTransport, RemoteCallError, RemoteCallExecutor};

mod policy;
mod runtime;

pub(crate) use policy::RetryWindow;
pub use policy::RetryPolicy;
pub use runtime::TokioSleeper;

/// Async sleeping abstraction so retry timing can be driven by tests.
#[async_trait]
pub trait RetrySleeper: Send + Sync {
    /// Suspend execution for `duration`.
    ///
    /// ```rust,no_run
    /// use async_trait::async_trait;
    /// use scim_bridge::domain::RetrySleeper;
    /// use std::sync::Mutex;
    /// use std::time::Duration;
    ///
    /// #[derive(Default)]
    /// struct CountingSleeper(Mutex<u32>);
    ///
    /// #[async_trait]
    /// impl RetrySleeper for CountingSleeper {
    ///     async fn sleep(&self, _duration: Duration) {
    ///         *self.0.lock().expect("counter mutex") += 1;
    ///     }
    /// }
    /// ```
    async fn sleep(&self, duration: Duration);
}

/// [`RemoteCallExecutor`] that wraps a [`GraphTransport`] with a bounded,
/// fixed-interval retry loop.
pub struct RetryingExecutor {
    transport: Arc<dyn GraphTransport>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn RetrySleeper>,
    policy: RetryPolicy,
}

impl RetryingExecutor {
    /// Build an executor that sleeps on the Tokio timer.
    pub fn new(
        transport: Arc<dyn GraphTransport>,
        clock: Arc<dyn Clock>,
        policy: RetryPolicy,
    ) -> Self {
        Self::with_sleeper(transport, clock, Arc::new(TokioSleeper), policy)
    }

    /// Build an executor with an injected sleeper.
    pub fn with_sleeper(
        transport: Arc<dyn GraphTransport>,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn RetrySleeper>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            clock,
            sleeper,
            policy,
        }
    }
}

#[async_trait]
impl RemoteCallExecutor for RetryingExecutor {
    async fn execute(
        &self,
        operation: RemoteOperation,
        variables: Value,
    ) -> Result<Value, RemoteCallError> {
        let window = RetryWindow::open(self.clock.utc(), &self.policy);
        let mut attempt: u32 = 0;

        loop {
            attempt = attempt.saturating_add(1);
            debug!(%operation, attempt, %variables, "issuing remote operation");

            let limit = window.attempt_limit(self.clock.utc());
            let sent = tokio::time::timeout(limit, self.transport.send(operation, &variables));
            let error = match sent.await {
                Ok(Ok(data)) => return Ok(data),
                Ok(Err(error)) => error,
                Err(_) => RemoteCallError::transport(format!(
                    "attempt cut off after {} ms at the retry deadline",
                    limit.as_millis()
                )),
            };

            if !error.is_retryable() {
                warn!(%operation, attempt, kind = error.kind(), %error, "remote operation failed");
                return Err(error);
            }

            let now = self.clock.utc();
            if !window.allows_wait(now) {
                warn!(
                    %operation,
                    attempt,
                    elapsed_ms = window.elapsed(now).num_milliseconds(),
                    %error,
                    "remote retry budget exhausted"
                );
                return Err(error);
            }

            info!(
                %operation,
                attempt,
                retry_in_ms = u64::try_from(self.policy.interval.as_millis()).unwrap_or(u64::MAX),
                %error,
                "retrying remote operation after transient failure"
            );
            self.sleeper.sleep(self.policy.interval).await;
        }
    }
}

#[cfg(test)]
mod tests;
