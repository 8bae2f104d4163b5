//! Login attempt orchestration.
//!
//! [`Authenticator`] performs one simulated login end to end:
//!
//! 1. Waits a randomised delay (a tokio timer, so other work keeps running)
//! 2. Re-reads the clock and rejects the attempt if a lock is active
//! 3. Checks the credentials against the [`CredentialDirectory`]
//! 4. Updates the shared [`AttemptTracker`] and returns a [`LoginOutcome`]
//!
//! Authentication failures are values, never errors. A lock that was already
//! running and a lock this attempt just triggered carry different messages and
//! a [`LockNotice`], so callers can render a countdown without inspecting text.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::attempts::{AttemptState, AttemptTracker, LockoutPolicy, ceil_seconds};
use crate::clock::{Clock, SystemClock};
use crate::directory::CredentialDirectory;
use crate::latency::{Latency, RandomLatency};
use crate::token::{RandomToken, TokenSource};

/// Message for a wrong email/password pair.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Email or password is incorrect.";

/// Why an attempt did not sign in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    InvalidCredentials,
    Locked,
}

/// Lock details attached to a [`FailureKind::Locked`] outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LockNotice {
    pub until: DateTime<Utc>,
    /// True when this attempt's failure started the lock.
    pub newly_triggered: bool,
}

/// Result of one login attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LoginOutcome {
    Success {
        token: String,
    },
    Failure {
        kind: FailureKind,
        message: String,
        lock: Option<LockNotice>,
    },
}

impl LoginOutcome {
    fn invalid_credentials() -> Self {
        Self::Failure {
            kind: FailureKind::InvalidCredentials,
            message: INVALID_CREDENTIALS_MESSAGE.to_owned(),
            lock: None,
        }
    }

    fn already_locked(until: DateTime<Utc>, remaining: TimeDelta) -> Self {
        Self::Failure {
            kind: FailureKind::Locked,
            message: format!(
                "Too many attempts. Try again in {}s.",
                ceil_seconds(remaining)
            ),
            lock: Some(LockNotice {
                until,
                newly_triggered: false,
            }),
        }
    }

    fn newly_locked(until: DateTime<Utc>, window: TimeDelta) -> Self {
        Self::Failure {
            kind: FailureKind::Locked,
            message: format!(
                "Account temporarily locked due to repeated failures. Please wait {} seconds.",
                window.num_seconds()
            ),
            lock: Some(LockNotice {
                until,
                newly_triggered: true,
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Success { token } => Some(token.as_str()),
            Self::Failure { .. } => None,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { message, .. } => Some(message.as_str()),
        }
    }

    pub fn lock(&self) -> Option<LockNotice> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { lock, .. } => *lock,
        }
    }
}

/// Runs simulated login attempts against a shared lockout tracker.
///
/// Cloning is cheap and every clone shares the same tracker, so one
/// `Authenticator` can serve any number of concurrent attempts.
#[derive(Clone)]
pub struct Authenticator {
    tracker: Arc<Mutex<AttemptTracker>>,
    directory: Arc<CredentialDirectory>,
    clock: Arc<dyn Clock>,
    latency: Arc<dyn Latency>,
    tokens: Arc<dyn TokenSource>,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("tracker", &self.attempt_state())
            .field("accounts", &self.directory.len())
            .finish_non_exhaustive()
    }
}

impl Authenticator {
    /// Default wiring: wall clock, 700-1200 ms latency, random tokens, 5
    /// failures / 30 s lockout.
    pub fn new(directory: CredentialDirectory) -> Self {
        Self {
            tracker: Arc::new(Mutex::new(AttemptTracker::default())),
            directory: Arc::new(directory),
            clock: Arc::new(SystemClock),
            latency: Arc::new(RandomLatency::default()),
            tokens: Arc::new(RandomToken::default()),
        }
    }

    /// Replaces the tracker with a fresh one using `policy`.
    pub fn with_policy(mut self, policy: LockoutPolicy) -> Self {
        self.tracker = Arc::new(Mutex::new(AttemptTracker::new(policy)));
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_latency(mut self, latency: impl Latency + 'static) -> Self {
        self.latency = Arc::new(latency);
        self
    }

    pub fn with_tokens(mut self, tokens: impl TokenSource + 'static) -> Self {
        self.tokens = Arc::new(tokens);
        self
    }

    pub fn directory(&self) -> &CredentialDirectory {
        &self.directory
    }

    pub fn policy(&self) -> LockoutPolicy {
        self.tracker().policy()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn attempt_state(&self) -> AttemptState {
        self.tracker().state()
    }

    pub fn is_locked(&self) -> bool {
        let now = self.clock.now();
        self.tracker().is_locked(now)
    }

    /// Time left on the active lock, if any.
    pub fn lock_remaining(&self) -> Option<TimeDelta> {
        let now = self.clock.now();
        self.tracker().remaining(now)
    }

    /// Performs one simulated login attempt.
    pub async fn attempt_login(&self, email: &str, password: &str) -> LoginOutcome {
        let delay = self.latency.next_delay();
        debug!("attempt_login: simulating {}ms of latency", delay.as_millis());
        tokio::time::sleep(delay).await;
        self.evaluate(email, password)
    }

    /// Like [`Self::attempt_login`], but gives up if `cancel` fires during the
    /// simulated delay.
    ///
    /// A cancelled attempt returns `None` and leaves the tracker untouched.
    pub async fn attempt_login_with_cancel(
        &self,
        email: &str,
        password: &str,
        cancel: &CancellationToken,
    ) -> Option<LoginOutcome> {
        let delay = self.latency.next_delay();
        debug!(
            "attempt_login_with_cancel: simulating {}ms of latency",
            delay.as_millis()
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!("attempt_login_with_cancel: attempt cancelled before evaluation");
                None
            }
            () = tokio::time::sleep(delay) => Some(self.evaluate(email, password)),
        }
    }

    /// Evaluates an attempt once the simulated delay is over.
    fn evaluate(&self, email: &str, password: &str) -> LoginOutcome {
        // Read the clock after the delay: the wait itself may cross the lock
        // boundary.
        let now = self.clock.now();
        let mut tracker = self.tracker();

        if let (Some(until), Some(remaining)) = (tracker.locked_until(), tracker.remaining(now)) {
            info!(
                "evaluate: rejected while locked ({}ms remaining)",
                remaining.num_milliseconds()
            );
            return LoginOutcome::already_locked(until, remaining);
        }

        if self.directory.verify(email, password) {
            tracker.record_success();
            drop(tracker);
            debug!("evaluate: credentials accepted for {email}");
            info!("evaluate: login succeeded");
            return LoginOutcome::Success {
                token: self.tokens.issue(),
            };
        }

        let window = tracker.policy().window;
        match tracker.record_failure(now) {
            Some(lock) => {
                warn!(
                    "evaluate: failure threshold reached, locked until {}",
                    lock.locked_until
                );
                LoginOutcome::newly_locked(lock.locked_until, window)
            }
            None => {
                info!(
                    "evaluate: invalid credentials ({} consecutive)",
                    tracker.consecutive_failures()
                );
                LoginOutcome::invalid_credentials()
            }
        }
    }

    fn tracker(&self) -> MutexGuard<'_, AttemptTracker> {
        // The tracker is plain counters; a panic elsewhere cannot leave it
        // half-updated.
        self.tracker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
