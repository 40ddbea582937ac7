//! Fixed-interval retry budget for remote calls.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

/// Retry timing applied to every remote operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Pause between consecutive attempts.
    pub interval: Duration,
    /// Upper bound on the time spent retrying one operation.
    pub max_elapsed: Duration,
}

impl RetryPolicy {
    /// Default pause between attempts.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);
    /// Default retry budget.
    pub const DEFAULT_MAX_ELAPSED: Duration = Duration::from_secs(15);
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            max_elapsed: Self::DEFAULT_MAX_ELAPSED,
        }
    }
}

/// Deadline tracking for one operation, anchored at its first attempt.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RetryWindow {
    started_at: DateTime<Utc>,
    deadline: DateTime<Utc>,
    interval: TimeDelta,
}

impl RetryWindow {
    pub(crate) fn open(started_at: DateTime<Utc>, policy: &RetryPolicy) -> Self {
        let budget = TimeDelta::from_std(policy.max_elapsed).unwrap_or(TimeDelta::MAX);
        let deadline = started_at
            .checked_add_signed(budget)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            started_at,
            deadline,
            interval: TimeDelta::from_std(policy.interval).unwrap_or(TimeDelta::MAX),
        }
    }

    /// Whether sleeping one more interval keeps the next attempt inside the
    /// budget.
    pub(crate) fn allows_wait(&self, now: DateTime<Utc>) -> bool {
        now.checked_add_signed(self.interval)
            .is_some_and(|next_attempt| next_attempt <= self.deadline)
    }

    /// Longest a single attempt started at `now` may run: whatever budget
    /// remains, but never less than one interval.
    pub(crate) fn attempt_limit(&self, now: DateTime<Utc>) -> Duration {
        let remaining = self
            .deadline
            .signed_duration_since(now)
            .to_std()
            .unwrap_or(Duration::ZERO);
        let interval = self.interval.to_std().unwrap_or(Duration::MAX);
        remaining.max(interval)
    }

    pub(crate) fn elapsed(&self, now: DateTime<Utc>) -> TimeDelta {
        now.signed_duration_since(self.started_at)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rstest::rstest;

    use super::*;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
            .single()
            .expect("valid start time")
    }

    #[rstest]
    #[case(0, true)]
    #[case(14, true)]
    #[case(15, false)]
    #[case(30, false)]
    fn wait_is_allowed_until_the_next_attempt_would_pass_the_deadline(
        #[case] elapsed_secs: i64,
        #[case] expected: bool,
    ) {
        let window = RetryWindow::open(start(), &RetryPolicy::default());
        let now = start() + TimeDelta::seconds(elapsed_secs);
        assert_eq!(window.allows_wait(now), expected);
    }

    #[test]
    fn zero_budget_never_waits() {
        let policy = RetryPolicy {
            interval: Duration::from_millis(250),
            max_elapsed: Duration::ZERO,
        };
        let window = RetryWindow::open(start(), &policy);
        assert!(!window.allows_wait(start()));
    }

    #[rstest]
    #[case(0, Duration::from_secs(15))]
    #[case(6, Duration::from_secs(9))]
    #[case(15, Duration::from_secs(1))]
    #[case(40, Duration::from_secs(1))]
    fn attempts_are_capped_at_the_remaining_budget(
        #[case] elapsed_secs: i64,
        #[case] expected: Duration,
    ) {
        let window = RetryWindow::open(start(), &RetryPolicy::default());
        let now = start() + TimeDelta::seconds(elapsed_secs);
        assert_eq!(window.attempt_limit(now), expected);
    }

    #[test]
    fn elapsed_is_measured_from_the_first_attempt() {
        let window = RetryWindow::open(start(), &RetryPolicy::default());
        let now = start() + TimeDelta::milliseconds(1_500);
        assert_eq!(window.elapsed(now), TimeDelta::milliseconds(1_500));
    }
}
