//! Scripted lockout walkthrough.
//!
//! Replays the canonical scenario (one success, failures up to the lockout
//! threshold, an attempt during the lock, then one after it) against a manual
//! clock with no simulated latency, so it finishes instantly and shows the
//! exact messages a user would see.

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use keyhole_business::{
    Authenticator, Clock as _, DemoAccount, FailureKind, FixedLatency, LoginConfig, LoginOutcome,
    ManualClock,
};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::{info, instrument};

use crate::output::Output;

#[derive(Debug, Tabled)]
struct DemoRow {
    #[tabled(rename = "#")]
    step: usize,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Password")]
    password: String,
    #[tabled(rename = "Outcome")]
    outcome: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "Failures")]
    failures: u32,
}

fn outcome_label(outcome: &LoginOutcome) -> &'static str {
    match outcome {
        LoginOutcome::Success { .. } => "success",
        LoginOutcome::Failure {
            kind: FailureKind::InvalidCredentials,
            ..
        } => "invalid credentials",
        LoginOutcome::Failure {
            lock: Some(lock), ..
        } if lock.newly_triggered => "locked (new)",
        LoginOutcome::Failure { .. } => "locked",
    }
}

struct Scenario<'a> {
    auth: &'a Authenticator,
    clock: &'a ManualClock,
    start: DateTime<Utc>,
    rows: Vec<DemoRow>,
}

impl Scenario<'_> {
    async fn attempt(&mut self, email: &str, password: &str) {
        let outcome = self.auth.attempt_login(email, password).await;
        let message = match &outcome {
            LoginOutcome::Success { token } => format!("token {token}"),
            LoginOutcome::Failure { message, .. } => message.clone(),
        };
        self.rows.push(DemoRow {
            step: self.rows.len() + 1,
            time: format!("+{}s", (self.clock.now() - self.start).num_seconds()),
            email: email.to_owned(),
            password: password.to_owned(),
            outcome: outcome_label(&outcome).to_owned(),
            message,
            failures: self.auth.attempt_state().consecutive_failures,
        });
    }
}

/// Runs the scenario for `account` and returns one row per attempt.
///
/// `clock` must be the clock `auth` reads; the scenario advances it across
/// the lock.
async fn run_scenario(
    auth: &Authenticator,
    clock: &ManualClock,
    account: &DemoAccount,
) -> Vec<DemoRow> {
    let policy = auth.policy();
    let wrong = format!("not-{}", account.password);
    let mut scenario = Scenario {
        auth,
        clock,
        start: clock.now(),
        rows: Vec::new(),
    };

    scenario
        .attempt(&account.email.to_uppercase(), &account.password)
        .await;
    for _ in 0..policy.threshold.max(1) {
        scenario.attempt(&account.email, &wrong).await;
    }

    let halfway = policy.window / 2;
    clock.advance(halfway);
    scenario.attempt(&account.email, &account.password).await;

    clock.advance(policy.window - halfway);
    scenario.attempt(&account.email, &account.password).await;

    scenario.rows
}

#[instrument(skip_all, name = "demo")]
pub async fn run_demo(login: &LoginConfig) -> Result<()> {
    let out = Output::new();

    let directory = login.directory();
    let account = directory
        .accounts()
        .first()
        .map(|account| (*account).clone())
        .context("The demo needs at least one configured account")?;

    let clock = ManualClock::new(Utc::now());
    let policy = login.policy()?;
    let auth = Authenticator::new(directory)
        .with_policy(policy)
        .with_clock(clock.clone())
        .with_latency(FixedLatency::default())
        .with_tokens(login.tokens());

    out.header("Keyhole lockout demo");
    out.labeled_indent("Account", &account.email, 2);
    out.labeled_indent(
        "Policy",
        format!(
            "lock after {} failures for {}s",
            policy.threshold,
            policy.window.num_seconds()
        ),
        2,
    );
    out.newline();

    let rows = run_scenario(&auth, &clock, &account).await;
    info!("Demo finished after {} attempts", rows.len());

    let mut table = Table::new(&rows);
    table.with(Style::rounded());
    out.print(table);
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use keyhole_business::{CredentialDirectory, LockoutPolicy, SequentialToken};

    use super::*;

    fn setup(policy: LockoutPolicy) -> (Authenticator, ManualClock, DemoAccount) {
        let account = DemoAccount::new("a@b.com", "pw1");
        let clock = ManualClock::default();
        let auth = Authenticator::new(CredentialDirectory::new([account.clone()]))
            .with_policy(policy)
            .with_clock(clock.clone())
            .with_latency(FixedLatency::default())
            .with_tokens(SequentialToken::default());
        (auth, clock, account)
    }

    #[tokio::test]
    async fn test_default_scenario_matches_documented_outcomes() {
        let (auth, clock, account) = setup(LockoutPolicy::default());

        let rows = run_scenario(&auth, &clock, &account).await;

        let outcomes: Vec<&str> = rows.iter().map(|row| row.outcome.as_str()).collect();
        assert_eq!(
            outcomes,
            [
                "success",
                "invalid credentials",
                "invalid credentials",
                "invalid credentials",
                "invalid credentials",
                "locked (new)",
                "locked",
                "success",
            ]
        );
        assert_eq!(rows[0].email, "A@B.COM");
        assert_eq!(rows[0].message, "token token-1");
        assert_eq!(
            rows[5].message,
            "Account temporarily locked due to repeated failures. Please wait 30 seconds."
        );
        assert_eq!(rows[6].message, "Too many attempts. Try again in 15s.");
        assert_eq!(rows[6].time, "+15s");
        assert_eq!(rows[7].time, "+30s");
        assert_eq!(rows[7].failures, 0);
    }

    #[tokio::test]
    async fn test_scenario_follows_configured_policy() {
        let (auth, clock, account) = setup(LockoutPolicy {
            threshold: 2,
            window: TimeDelta::seconds(10),
        });

        let rows = run_scenario(&auth, &clock, &account).await;

        assert_eq!(rows.len(), 5);
        assert_eq!(rows[1].failures, 1);
        assert_eq!(rows[2].outcome, "locked (new)");
        assert_eq!(rows[3].message, "Too many attempts. Try again in 5s.");
        assert_eq!(rows[4].outcome, "success");
    }
}
