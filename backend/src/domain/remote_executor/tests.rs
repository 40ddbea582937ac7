//! Unit tests for the retrying executor.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use mockable::{Clock, DefaultClock};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::{RetryPolicy, RetryingExecutor};
use crate::domain::RemoteOperation;
use crate::domain::ports::{
    GraphTransport, MockGraphTransport, RemoteCallError, RemoteCallExecutor,
};
use crate::test_support::clock::{ClockAdvancingSleeper, MutableClock, RecordingSleeper};

/// Transport that replays a script and repeats its last entry once exhausted.
struct TransportStub {
    scripted: Mutex<VecDeque<Result<Value, RemoteCallError>>>,
    fallback: Result<Value, RemoteCallError>,
    calls: AtomicUsize,
    clock: Arc<MutableClock>,
    attempt_times: Mutex<Vec<DateTime<Utc>>>,
}

impl TransportStub {
    fn new(
        clock: Arc<MutableClock>,
        scripted: Vec<Result<Value, RemoteCallError>>,
        fallback: Result<Value, RemoteCallError>,
    ) -> Self {
        Self {
            scripted: Mutex::new(scripted.into()),
            fallback,
            calls: AtomicUsize::new(0),
            clock,
            attempt_times: Mutex::new(Vec::new()),
        }
    }

    fn always(clock: Arc<MutableClock>, result: Result<Value, RemoteCallError>) -> Self {
        Self::new(clock, Vec::new(), result)
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn attempt_times(&self) -> Vec<DateTime<Utc>> {
        self.attempt_times.lock().expect("times mutex").clone()
    }
}

#[async_trait]
impl GraphTransport for TransportStub {
    async fn send(
        &self,
        _operation: RemoteOperation,
        _variables: &Value,
    ) -> Result<Value, RemoteCallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.attempt_times
            .lock()
            .expect("times mutex")
            .push(self.clock.utc());
        self.scripted
            .lock()
            .expect("script mutex")
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[fixture]
fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
        .single()
        .expect("valid start time")
}

#[fixture]
fn clock(start: DateTime<Utc>) -> Arc<MutableClock> {
    Arc::new(MutableClock::new(start))
}

fn executor(
    transport: Arc<dyn GraphTransport>,
    clock: Arc<MutableClock>,
) -> (RetryingExecutor, Arc<ClockAdvancingSleeper>) {
    let sleeper = Arc::new(ClockAdvancingSleeper::new(Arc::clone(&clock)));
    let executor = RetryingExecutor::with_sleeper(
        transport,
        clock,
        sleeper.clone(),
        RetryPolicy::default(),
    );
    (executor, sleeper)
}

#[rstest]
#[tokio::test]
async fn returns_data_from_first_successful_attempt(clock: Arc<MutableClock>) {
    let transport = Arc::new(TransportStub::always(
        Arc::clone(&clock),
        Ok(json!({ "users": [] })),
    ));
    let (executor, sleeper) = executor(transport.clone(), clock);

    let data = executor
        .execute(RemoteOperation::SearchUsers, json!({ "search": "ada" }))
        .await
        .expect("search succeeds");

    assert_eq!(data, json!({ "users": [] }));
    assert_eq!(transport.calls(), 1);
    assert!(sleeper.recorded().is_empty());
}

#[rstest]
#[tokio::test]
async fn persistent_transport_failure_stops_within_the_budget(
    start: DateTime<Utc>,
    clock: Arc<MutableClock>,
) {
    let transport = Arc::new(TransportStub::always(
        Arc::clone(&clock),
        Err(RemoteCallError::transport("connection refused")),
    ));
    let (executor, sleeper) = executor(transport.clone(), Arc::clone(&clock));

    let error = executor
        .execute(RemoteOperation::AddGroup, json!({ "displayName": "ops" }))
        .await
        .expect_err("transport never recovers");

    assert_eq!(error, RemoteCallError::transport("connection refused"));
    // Attempts at t = 0s, 1s, ..., 15s.
    assert_eq!(transport.calls(), 16);
    let times = transport.attempt_times();
    let last = times.last().copied().expect("at least one attempt");
    let elapsed = last.signed_duration_since(start);
    assert!(elapsed <= chrono::TimeDelta::seconds(16), "elapsed {elapsed}");
    assert_eq!(clock.utc().signed_duration_since(start).num_seconds(), 15);
    assert!(
        sleeper
            .recorded()
            .iter()
            .all(|pause| *pause == Duration::from_secs(1))
    );
}

#[rstest]
#[tokio::test]
async fn recovers_after_transient_failures(clock: Arc<MutableClock>) {
    let transport = Arc::new(TransportStub::new(
        Arc::clone(&clock),
        vec![
            Err(RemoteCallError::transport("503 Service Unavailable")),
            Err(RemoteCallError::transport("timed out")),
        ],
        Ok(json!({ "addGroup": { "group": { "id": "g-1" } } })),
    ));
    let (executor, sleeper) = executor(transport.clone(), clock);

    let data = executor
        .execute(RemoteOperation::AddGroup, json!({ "displayName": "ops" }))
        .await
        .expect("third attempt succeeds");

    assert_eq!(data["addGroup"]["group"]["id"], "g-1");
    assert_eq!(transport.calls(), 3);
    assert_eq!(sleeper.recorded(), vec![Duration::from_secs(1); 2]);
}

#[rstest]
#[case(RemoteCallError::query("Group already exists"))]
#[case(RemoteCallError::unexpected("missing data"))]
#[tokio::test]
async fn non_transport_failures_short_circuit(
    clock: Arc<MutableClock>,
    #[case] failure: RemoteCallError,
) {
    let mut transport = MockGraphTransport::new();
    let returned = failure.clone();
    transport
        .expect_send()
        .times(1)
        .returning(move |_, _| Err(returned.clone()));
    let sleeper = Arc::new(RecordingSleeper::default());
    let executor = RetryingExecutor::with_sleeper(
        Arc::new(transport),
        clock,
        sleeper.clone(),
        RetryPolicy::default(),
    );

    let error = executor
        .execute(RemoteOperation::AddGroup, json!({ "displayName": "ops" }))
        .await
        .expect_err("failure surfaces");

    assert_eq!(error, failure);
    assert!(sleeper.recorded().is_empty());
}

#[rstest]
#[tokio::test]
async fn zero_budget_makes_a_single_attempt(clock: Arc<MutableClock>) {
    let transport = Arc::new(TransportStub::always(
        Arc::clone(&clock),
        Err(RemoteCallError::transport("reset")),
    ));
    let sleeper = Arc::new(ClockAdvancingSleeper::new(Arc::clone(&clock)));
    let executor = RetryingExecutor::with_sleeper(
        transport.clone(),
        clock,
        sleeper,
        RetryPolicy {
            interval: Duration::from_millis(500),
            max_elapsed: Duration::ZERO,
        },
    );

    let result = executor
        .execute(RemoteOperation::RemoveGroup, json!({ "groupId": "g-1" }))
        .await;

    assert!(result.is_err());
    assert_eq!(transport.calls(), 1);
}

#[rstest]
#[tokio::test]
async fn forwards_operation_and_variables_to_transport(clock: Arc<MutableClock>) {
    let mut transport = MockGraphTransport::new();
    transport
        .expect_send()
        .withf(|operation, variables| {
            *operation == RemoteOperation::GroupByDisplayName
                && *variables == json!({ "displayName": "ops" })
        })
        .times(1)
        .returning(|_, _| Ok(json!({ "groupByDisplayName": null })));
    let (executor, _) = executor(Arc::new(transport), clock);

    let data = executor
        .execute(
            RemoteOperation::GroupByDisplayName,
            json!({ "displayName": "ops" }),
        )
        .await
        .expect("lookup succeeds");

    assert_eq!(data, json!({ "groupByDisplayName": null }));
}

/// Transport whose requests never complete.
struct StalledTransport {
    calls: AtomicUsize,
}

#[async_trait]
impl GraphTransport for StalledTransport {
    async fn send(
        &self,
        _operation: RemoteOperation,
        _variables: &Value,
    ) -> Result<Value, RemoteCallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}

#[tokio::test]
async fn stalled_attempt_is_cut_off_at_the_deadline() {
    let transport = Arc::new(StalledTransport {
        calls: AtomicUsize::new(0),
    });
    let executor = RetryingExecutor::new(
        transport.clone(),
        Arc::new(DefaultClock),
        RetryPolicy {
            interval: Duration::from_millis(20),
            max_elapsed: Duration::from_millis(100),
        },
    );
    let started = std::time::Instant::now();

    let error = executor
        .execute(RemoteOperation::SearchUsers, json!({ "search": "ada" }))
        .await
        .expect_err("stalled transport never answers");

    assert_eq!(error.kind(), "transport");
    assert!(error.is_retryable());
    assert!(transport.calls.load(Ordering::SeqCst) >= 1);
    assert!(
        started.elapsed() < Duration::from_secs(2),
        "caller waited {:?}",
        started.elapsed()
    );
}
