//! Controllable time sources for retry and envelope tests.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;

use crate::domain::RetrySleeper;

/// Clock whose reading only changes when a test advances it.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: Duration) {
        let delta = match TimeDelta::from_std(delta) {
            Ok(delta) => delta,
            Err(error) => {
                panic!("failed to convert Duration to TimeDelta: {error}; delta={delta:?}")
            }
        };
        *self.lock_clock() += delta;
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Sleeper that records each requested pause.
#[derive(Default)]
pub struct RecordingSleeper(pub Mutex<Vec<Duration>>);

impl RecordingSleeper {
    pub fn recorded(&self) -> Vec<Duration> {
        match self.0.lock() {
            Ok(entries) => entries.clone(),
            Err(_) => panic!("sleeper mutex"),
        }
    }
}

#[async_trait]
impl RetrySleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        match self.0.lock() {
            Ok(mut entries) => entries.push(duration),
            Err(_) => panic!("sleeper mutex"),
        }
    }
}

/// Sleeper that moves a [`MutableClock`] forward instead of waiting, so
/// retry budgets can be exercised in virtual time.
pub struct ClockAdvancingSleeper {
    clock: Arc<MutableClock>,
    slept: RecordingSleeper,
}

impl ClockAdvancingSleeper {
    pub fn new(clock: Arc<MutableClock>) -> Self {
        Self {
            clock,
            slept: RecordingSleeper::default(),
        }
    }

    pub fn recorded(&self) -> Vec<Duration> {
        self.slept.recorded()
    }
}

#[async_trait]
impl RetrySleeper for ClockAdvancingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.sleep(duration).await;
        self.clock.advance(duration);
    }
}
