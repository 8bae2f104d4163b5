//! CLI workflow tests.
//!
//! These don't spawn the binary. They drive the same pieces `keyhole` wires
//! together: a `[login]` table parsed from TOML, `KEYHOLE_*` overrides on
//! top, and the resulting authenticator and form.

use chrono::TimeDelta;
use keyhole_business::{
    Authenticator, FailureKind, FixedLatency, FormStatus, LoginConfig, LoginForm, ManualClock,
    SequentialToken,
};
use serde::Deserialize;

#[derive(Deserialize)]
struct ConfigFile {
    #[serde(default)]
    login: LoginConfig,
}

const CONFIG: &str = r#"
[login]
lockout_threshold = 3
lockout_window_secs = 60

[[login.accounts]]
email = "ops@example.com"
password = "hunter2"
name = "Ops"
"#;

fn parse(toml_text: &str) -> LoginConfig {
    toml::from_str::<ConfigFile>(toml_text)
        .expect("valid config")
        .login
}

fn authenticator(login: &LoginConfig, clock: &ManualClock) -> Authenticator {
    Authenticator::new(login.directory())
        .with_policy(login.policy().expect("policy"))
        .with_clock(clock.clone())
        .with_latency(FixedLatency::default())
        .with_tokens(SequentialToken::default())
}

#[tokio::test]
async fn test_configured_accounts_replace_builtin_ones() {
    let login = parse(CONFIG);
    let clock = ManualClock::default();
    let auth = authenticator(&login, &clock);

    assert_eq!(auth.directory().len(), 1);
    assert!(
        auth.attempt_login("OPS@example.com", "hunter2")
            .await
            .is_success(),
        "configured account signs in"
    );
    assert!(
        !auth
            .attempt_login("demo@keyhole.dev", "Demo1234!")
            .await
            .is_success(),
        "built-in accounts are gone once accounts are configured"
    );
}

#[tokio::test]
async fn test_configured_policy_locks_after_three_failures() {
    let login = parse(CONFIG);
    let clock = ManualClock::default();
    let auth = authenticator(&login, &clock);

    for _ in 0..2 {
        let outcome = auth.attempt_login("ops@example.com", "nope").await;
        assert_eq!(
            outcome.failure_kind(),
            Some(FailureKind::InvalidCredentials)
        );
    }
    let third = auth.attempt_login("ops@example.com", "nope").await;

    assert_eq!(
        third.message(),
        Some("Account temporarily locked due to repeated failures. Please wait 60 seconds.")
    );

    clock.advance(TimeDelta::seconds(59));
    assert!(auth.is_locked(), "still locked one second before expiry");
    clock.advance(TimeDelta::seconds(1));
    assert!(!auth.is_locked(), "lock expires after the configured window");
}

#[test]
fn test_env_overrides_win_over_the_file() {
    let login = parse(CONFIG)
        .with_env_overrides([
            ("KEYHOLE_LOCKOUT_THRESHOLD", "7"),
            ("KEYHOLE_LATENCY_MIN_MS", "0"),
            ("KEYHOLE_LATENCY_MAX_MS", "0"),
            ("UNRELATED", "1"),
        ])
        .expect("overrides apply");

    assert_eq!(login.lockout_threshold, 7);
    assert_eq!(login.lockout_window_secs, 60, "untouched by the environment");
    assert_eq!(login.latency_max_ms, 0);
    assert_eq!(login.accounts.len(), 1);
}

#[test]
fn test_invalid_override_is_rejected() {
    let result = parse(CONFIG).with_env_overrides([("KEYHOLE_LOCKOUT_THRESHOLD", "0")]);

    assert!(result.is_err(), "a zero threshold cannot be configured");
}

#[test]
fn test_empty_file_means_defaults() {
    assert_eq!(parse(""), LoginConfig::default());
}

#[tokio::test]
async fn test_form_reports_lock_from_configured_policy() {
    let login = parse(CONFIG);
    let clock = ManualClock::default();
    let auth = authenticator(&login, &clock);
    let mut form = LoginForm::new();
    form.set_email("ops@example.com");

    for _ in 0..3 {
        form.set_password("nope");
        let credentials = form.begin_submit(auth.now()).expect("submittable");
        let outcome = auth
            .attempt_login(&credentials.email, &credentials.password)
            .await;
        form.finish(outcome);
    }

    assert!(matches!(
        form.status(),
        FormStatus::Failed {
            kind: FailureKind::Locked,
            ..
        }
    ));
    assert_eq!(
        form.countdown_message(auth.now()).as_deref(),
        Some("Try again in 60s.")
    );
}
