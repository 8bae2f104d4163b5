//! Client-side login core for Keyhole.
//!
//! The heart of the crate is the attempt state machine: [`Authenticator`]
//! runs one simulated login against a [`CredentialDirectory`], consulting and
//! updating a shared [`AttemptTracker`] that locks further attempts for a
//! while after repeated failures. Around it sit the pieces a front end needs:
//! field validation, the [`LoginForm`] view state, and the single persisted
//! "remembered email".

mod attempts;
mod clock;
mod config;
mod directory;
mod error;
mod form;
mod latency;
mod login;
mod remember;
mod token;
mod validation;

pub use attempts::{
    AttemptState, AttemptTracker, DEFAULT_LOCKOUT_THRESHOLD, DEFAULT_LOCKOUT_WINDOW_SECS,
    LockTriggered, LockoutPolicy, ceil_seconds,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ENV_PREFIX, LoginConfig, MAX_LOCKOUT_WINDOW_SECS};
pub use directory::{CredentialDirectory, DemoAccount, builtin_accounts, normalize_email};
pub use error::{Error, Result};
pub use form::{
    Announcement, CAPS_LOCK_WARNING, Focus, FormStatus, LoginForm, Politeness,
    SIGNED_IN_MESSAGE, SIGNING_IN_MESSAGE, infer_caps_lock,
};
pub use latency::{
    DEFAULT_LATENCY_MAX_MS, DEFAULT_LATENCY_MIN_MS, FixedLatency, Latency, RandomLatency,
};
pub use login::{
    Authenticator, FailureKind, INVALID_CREDENTIALS_MESSAGE, LockNotice, LoginOutcome,
};
pub use remember::{
    KeyValueStore, MemoryStore, REMEMBERED_EMAIL_KEY, RememberChange, RememberedEmail,
};
pub use token::{DEFAULT_TOKEN_LENGTH, RandomToken, SequentialToken, TokenSource};
pub use validation::{
    Credentials, Field, FieldError, ValidationErrors, is_valid_email, validate, validate_email,
};
