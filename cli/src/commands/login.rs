//! Interactive sign-in command.
//!
//! Drives a [`LoginForm`] from terminal prompts: the form decides what is
//! valid, what to announce and where focus goes; this module only maps those
//! decisions onto inquire prompts and styled output.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context as _, Result};
use inquire::{Confirm, InquireError, Password, PasswordDisplayMode, Text};
use keyhole_business::{
    Authenticator, FailureKind, Field, Focus, FormStatus, KeyValueStore, LoginConfig, LoginForm,
    RememberChange, RememberedEmail, infer_caps_lock,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::config::FileStore;
use crate::output::Output;

const COUNTDOWN_TICK: Duration = Duration::from_millis(200);
const TOKEN_PREVIEW_CHARS: usize = 10;

/// Shortens a session token for display.
fn token_preview(token: &str) -> String {
    let mut chars = token.chars();
    let shown: String = chars.by_ref().take(TOKEN_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{shown}…")
    } else {
        shown
    }
}

/// Maps an inquire answer, treating Esc and Ctrl+C as "no answer".
fn answered<T>(result: Result<T, InquireError>, what: &str) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read {what}")),
    }
}

/// The email prompt is skipped when focus already moved on to the password
/// and the email has nothing to fix.
fn needs_email_prompt(form: &LoginForm) -> bool {
    form.focus_target() != Some(Focus::Password)
        || form.email().trim().is_empty()
        || form.error_for(Field::Email).is_some()
}

/// Prompts for whatever the form needs. Returns `false` if the user backed
/// out.
fn prompt_fields(out: &Output, form: &mut LoginForm) -> Result<bool> {
    if needs_email_prompt(form) {
        let help = form
            .error_for(Field::Email)
            .map_or_else(|| "The address of your account".to_owned(), |e| e.to_string());
        let prompt = Text::new("Email:")
            .with_initial_value(form.email())
            .with_help_message(&help)
            .prompt();
        let Some(email) = answered(prompt, "email")? else {
            return Ok(false);
        };
        form.set_email(email);
    } else {
        out.labeled_indent("Email", form.email(), 0);
    }

    let display_mode = if form.show_password() {
        PasswordDisplayMode::Full
    } else {
        PasswordDisplayMode::Masked
    };
    let help = form.error_for(Field::Password).map_or_else(
        || "Ctrl+R shows or hides the password".to_owned(),
        |e| e.to_string(),
    );
    let prompt = Password::new("Password:")
        .with_display_mode(display_mode)
        .with_display_toggle_enabled()
        .without_confirmation()
        .with_help_message(&help)
        .prompt();
    let Some(password) = answered(prompt, "password")? else {
        return Ok(false);
    };

    // A terminal cannot read modifier state, so guess from what was typed.
    form.set_caps_lock(infer_caps_lock(&password));
    form.set_password(password);
    Ok(true)
}

/// Shows a live countdown until the form may submit again. Returns `false`
/// if interrupted.
async fn wait_out_lock(out: &Output, auth: &Authenticator, form: &LoginForm) -> bool {
    let mut shown: Option<String> = None;

    while let Some(message) = form.countdown_message(auth.now()) {
        if shown.as_ref() != Some(&message) {
            out.status_line(&message);
            shown = Some(message);
        }
        tokio::select! {
            () = tokio::time::sleep(COUNTDOWN_TICK) => {}
            _ = tokio::signal::ctrl_c() => {
                out.clear_status_line();
                return false;
            }
        }
    }

    if shown.is_some() {
        out.clear_status_line();
        out.info("The lock has expired. You can try again.");
    }
    true
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Ctrl+C received, cancelling sign-in");
        cancel.cancel();
    }
}

/// Applies a remember-me choice. Storage follows as soon as the preference
/// changes; an unchanged preference touches nothing.
fn set_remember_me<S: KeyValueStore>(
    remembered: &mut RememberedEmail<S>,
    form: &mut LoginForm,
    remember_me: bool,
) -> keyhole_business::Result<Option<RememberChange>> {
    if form.remember_me == remember_me {
        return Ok(None);
    }
    form.remember_me = remember_me;
    remembered.sync(remember_me, form.email()).map(Some)
}

fn report_remember_change(
    out: &Output,
    config_path: &Path,
    change: keyhole_business::Result<RememberChange>,
) {
    match change {
        Ok(RememberChange::Saved) => {
            out.dim(format!("Email remembered in {}", config_path.display()));
        }
        Ok(RememberChange::Cleared) => out.dim("Email will not be remembered."),
        Ok(RememberChange::Unchanged) => {}
        Err(e) => {
            warn!("Failed to update remembered email: {e}");
            out.warning(format!("Could not update the remembered email: {e}"));
        }
    }
}

/// Runs the interactive sign-in. Returns whether the user ended up signed
/// in.
#[instrument(skip_all, name = "login")]
pub async fn run_login(
    login: &LoginConfig,
    config_path: &Path,
    email: Option<String>,
    show_password: bool,
) -> Result<bool> {
    let out = Output::new();
    let auth = login
        .authenticator()
        .context("Invalid login configuration")?;

    let mut remembered = RememberedEmail::new(FileStore::open(config_path)?);
    let stored = remembered.load().unwrap_or_else(|e| {
        warn!("Ignoring remembered email: {e}");
        None
    });
    let mut form = LoginForm::with_remembered(stored);
    if let Some(email) = email {
        form.set_email(email);
    }
    if show_password {
        form.toggle_password_visibility();
    }

    out.header("Sign in to Keyhole");
    out.dim("Press Ctrl+C while signing in to cancel.");
    out.newline();

    let mut remember_asked = false;
    loop {
        if !wait_out_lock(&out, &auth, &form).await || !prompt_fields(&out, &mut form)? {
            return Ok(false);
        }
        if let Some(warning) = form.caps_lock_warning() {
            out.warning(warning);
        }
        if !remember_asked {
            let prompt = Confirm::new("Remember this email on this device?")
                .with_default(form.remember_me)
                .prompt();
            let Some(remember_me) = answered(prompt, "remember-me choice")? else {
                return Ok(false);
            };
            if let Some(change) = set_remember_me(&mut remembered, &mut form, remember_me).transpose()
            {
                report_remember_change(&out, config_path, change);
            }
            remember_asked = true;
        }

        let Some(credentials) = form.begin_submit(auth.now()) else {
            if let Some(announcement) = form.announcement() {
                out.announce(announcement);
            }
            continue;
        };
        if let Some(announcement) = form.announcement() {
            out.announce(announcement);
        }

        let cancel = CancellationToken::new();
        let watcher = tokio::spawn(cancel_on_ctrl_c(cancel.clone()));
        let outcome = auth
            .attempt_login_with_cancel(&credentials.email, &credentials.password, &cancel)
            .await;
        watcher.abort();

        let Some(outcome) = outcome else {
            form.cancel_submit();
            if let Some(announcement) = form.announcement() {
                out.announce(announcement);
            }
            return Ok(false);
        };

        form.finish(outcome);
        if let Some(announcement) = form.announcement() {
            out.announce(announcement);
        }

        match form.status().clone() {
            FormStatus::SignedIn { email, token } => {
                info!("Signed in");
                out.labeled_indent("Account", &email, 2);
                out.labeled_indent("Session token", token_preview(&token), 2);
                if form.remember_me {
                    // Keep the stored email in step with the one that worked.
                    let change = remembered.sync(true, form.email());
                    report_remember_change(&out, config_path, change);
                }
                return Ok(true);
            }
            FormStatus::Failed {
                kind: FailureKind::InvalidCredentials,
                ..
            } => {
                let prompt = Confirm::new("Try again?").with_default(true).prompt();
                if answered(prompt, "retry choice")? != Some(true) {
                    return Ok(false);
                }
            }
            // The countdown at the top of the loop takes over.
            FormStatus::Failed {
                kind: FailureKind::Locked,
                ..
            }
            | FormStatus::Idle
            | FormStatus::Submitting => {}
        }
    }
}
