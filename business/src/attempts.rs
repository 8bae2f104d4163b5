//! Consecutive-failure counting and the time-boxed lockout window.
//!
//! [`AttemptTracker`] is the shared rate-limiting state every login attempt
//! consults. It is plain data with no interior locking; the
//! [`crate::Authenticator`] serialises access to it.
//!
//! ## Lifecycle
//!
//! - Every wrong credential pair calls [`AttemptTracker::record_failure`].
//! - When the failure count reaches the policy threshold, a lock is set for
//!   the policy window and the counter starts over from zero.
//! - A correct credential pair calls [`AttemptTracker::record_success`], which
//!   resets the counter but never shortens a lock that is already running.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

/// Failures allowed before a lock triggers.
pub const DEFAULT_LOCKOUT_THRESHOLD: u32 = 5;

/// Lock duration, in seconds, once the threshold is reached.
pub const DEFAULT_LOCKOUT_WINDOW_SECS: i64 = 30;

/// How many failures trigger a lock, and for how long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub threshold: u32,
    pub window: TimeDelta,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_LOCKOUT_THRESHOLD,
            window: TimeDelta::seconds(DEFAULT_LOCKOUT_WINDOW_SECS),
        }
    }
}

/// Snapshot of the tracker's counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttemptState {
    pub consecutive_failures: u32,
    /// `None` or a past instant means "not locked".
    pub locked_until: Option<DateTime<Utc>>,
}

/// Reported by [`AttemptTracker::record_failure`] when that failure started a lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockTriggered {
    pub locked_until: DateTime<Utc>,
}

#[derive(Debug, Default, Clone)]
pub struct AttemptTracker {
    policy: LockoutPolicy,
    state: AttemptState,
}

impl AttemptTracker {
    pub fn new(policy: LockoutPolicy) -> Self {
        Self {
            policy,
            state: AttemptState::default(),
        }
    }

    pub fn policy(&self) -> LockoutPolicy {
        self.policy
    }

    pub fn state(&self) -> AttemptState {
        self.state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.state.consecutive_failures
    }

    pub fn locked_until(&self) -> Option<DateTime<Utc>> {
        self.state.locked_until
    }

    /// True iff `now` falls before the lock expiry.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.state.locked_until.is_some_and(|until| now < until)
    }

    /// Time left on the current lock, or `None` if not locked at `now`.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        self.state
            .locked_until
            .filter(|until| now < *until)
            .map(|until| until - now)
    }

    /// Counts one wrong credential pair.
    ///
    /// Returns the new lock when this failure reached the threshold. The
    /// counter is reset to zero in that case so the next streak starts fresh
    /// once the lock expires.
    pub fn record_failure(&mut self, now: DateTime<Utc>) -> Option<LockTriggered> {
        self.state.consecutive_failures = self.state.consecutive_failures.saturating_add(1);

        if self.state.consecutive_failures < self.policy.threshold.max(1) {
            return None;
        }

        // A policy built by hand can carry a window past chrono's range.
        let locked_until = now
            .checked_add_signed(self.policy.window)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.state.locked_until = Some(locked_until);
        self.state.consecutive_failures = 0;
        Some(LockTriggered { locked_until })
    }

    /// Resets the failure streak. An active lock keeps running.
    pub fn record_success(&mut self) {
        self.state.consecutive_failures = 0;
    }
}

/// Whole seconds left on a lock, rounded up.
pub fn ceil_seconds(remaining: TimeDelta) -> i64 {
    let millis = remaining.num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    (millis + 999) / 1000
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(millis: i64) -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + TimeDelta::milliseconds(millis)
    }

    #[test]
    fn test_fresh_tracker_is_unlocked() {
        let tracker = AttemptTracker::default();

        assert!(!tracker.is_locked(at(0)));
        assert_eq!(tracker.consecutive_failures(), 0);
        assert_eq!(tracker.remaining(at(0)), None);
    }

    #[test]
    fn test_failures_below_threshold_do_not_lock() {
        let mut tracker = AttemptTracker::default();

        for i in 0..4 {
            assert_eq!(tracker.record_failure(at(i)), None);
        }

        assert_eq!(tracker.consecutive_failures(), 4);
        assert!(!tracker.is_locked(at(10)));
    }

    #[test]
    fn test_fifth_failure_locks_and_resets_counter() {
        let mut tracker = AttemptTracker::default();
        for _ in 0..4 {
            tracker.record_failure(at(0));
        }

        let lock = tracker.record_failure(at(1_000));

        assert_eq!(
            lock,
            Some(LockTriggered {
                locked_until: at(31_000)
            })
        );
        assert_eq!(
            tracker.consecutive_failures(),
            0,
            "counter resets when a lock triggers"
        );
        assert!(tracker.is_locked(at(1_000)));
        assert!(tracker.is_locked(at(30_999)));
        assert!(!tracker.is_locked(at(31_000)), "lock expiry is exclusive");
    }

    #[test]
    fn test_success_resets_counter_but_keeps_lock() {
        let mut tracker = AttemptTracker::new(LockoutPolicy {
            threshold: 2,
            window: TimeDelta::seconds(10),
        });
        tracker.record_failure(at(0));
        tracker.record_failure(at(0));
        tracker.record_failure(at(0));
        assert_eq!(tracker.consecutive_failures(), 1);

        tracker.record_success();

        assert_eq!(tracker.consecutive_failures(), 0);
        assert!(tracker.is_locked(at(5_000)), "success must not clear a lock");
    }

    #[test]
    fn test_remaining_counts_down_to_expiry() {
        let mut tracker = AttemptTracker::default();
        for _ in 0..5 {
            tracker.record_failure(at(0));
        }

        assert_eq!(tracker.remaining(at(0)), Some(TimeDelta::seconds(30)));
        assert_eq!(
            tracker.remaining(at(29_500)),
            Some(TimeDelta::milliseconds(500))
        );
        assert_eq!(tracker.remaining(at(30_000)), None);
    }

    #[test]
    fn test_new_streak_after_lock_expires() {
        let mut tracker = AttemptTracker::default();
        for _ in 0..5 {
            tracker.record_failure(at(0));
        }

        for _ in 0..4 {
            assert_eq!(tracker.record_failure(at(40_000)), None);
        }
        let second = tracker.record_failure(at(40_000));

        assert_eq!(
            second.map(|lock| lock.locked_until),
            Some(at(70_000)),
            "a full new streak is needed to lock again"
        );
    }

    #[test]
    fn test_zero_threshold_behaves_like_one() {
        let mut tracker = AttemptTracker::new(LockoutPolicy {
            threshold: 0,
            window: TimeDelta::seconds(1),
        });

        assert!(tracker.record_failure(at(0)).is_some());
    }

    #[test]
    fn test_out_of_range_window_saturates() {
        let mut tracker = AttemptTracker::new(LockoutPolicy {
            threshold: 1,
            window: TimeDelta::seconds(9_000_000_000_000_000),
        });

        let lock = tracker.record_failure(at(0)).expect("locks");

        assert_eq!(lock.locked_until, DateTime::<Utc>::MAX_UTC);
        assert!(tracker.is_locked(at(0)), "saturated lock is still active");
        assert!(tracker.remaining(at(0)).is_some());
    }

    #[test]
    fn test_state_snapshot_serializes() {
        let mut tracker = AttemptTracker::default();
        tracker.record_failure(at(0));
        assert_eq!(
            serde_json::to_value(tracker.state()).expect("serialize"),
            serde_json::json!({ "consecutive_failures": 1, "locked_until": null })
        );

        for _ in 0..4 {
            tracker.record_failure(at(0));
        }
        assert_eq!(
            serde_json::to_value(tracker.state()).expect("serialize"),
            serde_json::json!({
                "consecutive_failures": 0,
                "locked_until": "1970-01-01T00:00:30Z"
            })
        );
    }

    #[test]
    fn test_ceil_seconds_rounds_up_partial_seconds() {
        assert_eq!(ceil_seconds(TimeDelta::milliseconds(30_000)), 30);
        assert_eq!(ceil_seconds(TimeDelta::milliseconds(29_001)), 30);
        assert_eq!(ceil_seconds(TimeDelta::milliseconds(1)), 1);
        assert_eq!(ceil_seconds(TimeDelta::zero()), 0);
        assert_eq!(ceil_seconds(TimeDelta::milliseconds(-5)), 0);
    }
}
