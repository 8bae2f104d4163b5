//! Framework-free state of the login form.
//!
//! [`LoginForm`] is what a front end renders: field values, per-field errors,
//! the show/hide password toggle, caps-lock warning, the live-region
//! announcement for screen readers, where focus should go next, and the
//! lockout countdown. It never talks to the [`crate::Authenticator`] itself;
//! the host calls [`LoginForm::begin_submit`], runs the attempt, then feeds the
//! outcome back through [`LoginForm::finish`].

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use log::debug;

use crate::attempts::ceil_seconds;
use crate::login::{FailureKind, LoginOutcome};
use crate::validation::{Credentials, Field, FieldError, ValidationErrors, validate};

pub const CAPS_LOCK_WARNING: &str = "Caps Lock is on.";
pub const SIGNING_IN_MESSAGE: &str = "Signing in…";
pub const SIGNED_IN_MESSAGE: &str = "Signed in successfully.";

const MASK_CHAR: char = '•';

/// Progress of the current submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FormStatus {
    #[default]
    Idle,
    Submitting,
    SignedIn {
        email: String,
        token: String,
    },
    Failed {
        kind: FailureKind,
        message: String,
    },
}

/// Control that should receive focus after the last transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Email,
    Password,
    Submit,
}

/// `aria-live` urgency of an announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Politeness {
    Polite,
    Assertive,
}

/// Text for the form's live region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub text: String,
    pub politeness: Politeness,
}

impl Announcement {
    fn polite(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            politeness: Politeness::Polite,
        }
    }

    fn assertive(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            politeness: Politeness::Assertive,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct LoginForm {
    email: String,
    password: String,
    pub remember_me: bool,
    show_password: bool,
    caps_lock: bool,
    status: FormStatus,
    errors: ValidationErrors,
    announcement: Option<Announcement>,
    focus: Option<Focus>,
    locked_until: Option<DateTime<Utc>>,
}

impl LoginForm {
    pub fn new() -> Self {
        Self {
            focus: Some(Focus::Email),
            ..Self::default()
        }
    }

    /// Form pre-filled with a remembered email, if one was stored.
    pub fn with_remembered(email: Option<String>) -> Self {
        match email {
            Some(email) => Self {
                email,
                remember_me: true,
                focus: Some(Focus::Password),
                ..Self::default()
            },
            None => Self::new(),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn status(&self) -> &FormStatus {
        &self.status
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn error_for(&self, field: Field) -> Option<FieldError> {
        self.errors.for_field(field)
    }

    pub fn announcement(&self) -> Option<&Announcement> {
        self.announcement.as_ref()
    }

    pub fn focus_target(&self) -> Option<Focus> {
        self.focus
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.status, FormStatus::Submitting)
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self.status, FormStatus::SignedIn { .. })
    }

    /// Editing a field clears that field's error.
    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
        self.errors.clear_field(Field::Email);
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
        self.errors.clear_field(Field::Password);
    }

    pub fn show_password(&self) -> bool {
        self.show_password
    }

    /// Flips password visibility and returns the new state.
    pub fn toggle_password_visibility(&mut self) -> bool {
        self.show_password = !self.show_password;
        self.announcement = Some(Announcement::polite(if self.show_password {
            "Password shown."
        } else {
            "Password hidden."
        }));
        self.focus = Some(Focus::Password);
        self.show_password
    }

    /// The password as it should be drawn: masked unless shown.
    pub fn password_display(&self) -> Cow<'_, str> {
        if self.show_password {
            Cow::Borrowed(&self.password)
        } else {
            Cow::Owned(
                std::iter::repeat_n(MASK_CHAR, self.password.chars().count()).collect(),
            )
        }
    }

    pub fn caps_lock(&self) -> bool {
        self.caps_lock
    }

    /// Records the host's caps-lock reading; turning it on is announced once.
    pub fn set_caps_lock(&mut self, on: bool) {
        if on && !self.caps_lock {
            self.announcement = Some(Announcement::polite(CAPS_LOCK_WARNING));
        }
        self.caps_lock = on;
    }

    pub fn caps_lock_warning(&self) -> Option<&'static str> {
        self.caps_lock.then_some(CAPS_LOCK_WARNING)
    }

    /// Whole seconds left on a lock reported by the last outcome.
    pub fn lockout_countdown(&self, now: DateTime<Utc>) -> Option<i64> {
        let until = self.locked_until?;
        (now < until).then(|| ceil_seconds(until - now))
    }

    pub fn countdown_message(&self, now: DateTime<Utc>) -> Option<String> {
        self.lockout_countdown(now)
            .map(|secs| format!("Try again in {secs}s."))
    }

    pub fn can_submit(&self, now: DateTime<Utc>) -> bool {
        !self.is_submitting() && self.lockout_countdown(now).is_none()
    }

    /// Validates the fields and, if they pass, moves to `Submitting`.
    ///
    /// Returns `None` when submission is not allowed right now or a field is
    /// invalid; in the latter case errors, focus and announcement are set.
    pub fn begin_submit(&mut self, now: DateTime<Utc>) -> Option<Credentials> {
        if !self.can_submit(now) {
            debug!("LoginForm: submit ignored (submitting or locked)");
            return None;
        }

        match validate(&self.email, &self.password) {
            Ok(credentials) => {
                self.errors = ValidationErrors::default();
                self.status = FormStatus::Submitting;
                self.announcement = Some(Announcement::polite(SIGNING_IN_MESSAGE));
                self.focus = None;
                Some(credentials)
            }
            Err(errors) => {
                let text = errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                self.focus = errors.first().map(|e| match e.field() {
                    Field::Email => Focus::Email,
                    Field::Password => Focus::Password,
                });
                self.announcement = Some(Announcement::assertive(text));
                self.errors = errors;
                None
            }
        }
    }

    /// Abandons an in-flight submission without recording any result.
    pub fn cancel_submit(&mut self) {
        if self.is_submitting() {
            self.status = FormStatus::Idle;
            self.announcement = Some(Announcement::polite("Sign-in cancelled."));
            self.focus = Some(Focus::Submit);
        }
    }

    /// Applies the result of the attempt started by [`Self::begin_submit`].
    pub fn finish(&mut self, outcome: LoginOutcome) {
        self.password.clear();

        match outcome {
            LoginOutcome::Success { token } => {
                self.status = FormStatus::SignedIn {
                    email: self.email.trim().to_owned(),
                    token,
                };
                self.locked_until = None;
                self.announcement = Some(Announcement::polite(SIGNED_IN_MESSAGE));
                self.focus = None;
            }
            LoginOutcome::Failure {
                kind,
                message,
                lock,
            } => {
                self.locked_until = lock.map(|l| l.until);
                self.focus = Some(match kind {
                    FailureKind::InvalidCredentials => Focus::Password,
                    FailureKind::Locked => Focus::Submit,
                });
                self.announcement = Some(Announcement::assertive(message.clone()));
                self.status = FormStatus::Failed { kind, message };
            }
        }
    }
}

/// Guesses caps lock from typed text: letters present, none lower case.
///
/// Terminals and other hosts that cannot read modifier state use this as a
/// hint after the fact.
pub fn infer_caps_lock(text: &str) -> bool {
    text.chars().any(char::is_uppercase) && !text.chars().any(char::is_lowercase)
}
