use chrono::TimeDelta;
use log::info;
use serde::{Deserialize, Serialize};

use crate::attempts::{DEFAULT_LOCKOUT_THRESHOLD, DEFAULT_LOCKOUT_WINDOW_SECS, LockoutPolicy};
use crate::directory::{CredentialDirectory, DemoAccount};
use crate::error::{Error, Result};
use crate::latency::{DEFAULT_LATENCY_MAX_MS, DEFAULT_LATENCY_MIN_MS, RandomLatency};
use crate::login::Authenticator;
use crate::token::{DEFAULT_TOKEN_LENGTH, RandomToken};

/// Prefix for environment overrides, e.g. `KEYHOLE_LOCKOUT_THRESHOLD=3`.
pub const ENV_PREFIX: &str = "KEYHOLE_";

/// Longest configurable lock: one year.
pub const MAX_LOCKOUT_WINDOW_SECS: u64 = 365 * 24 * 60 * 60;

/// Tunables of the login core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    pub lockout_threshold: u32,
    pub lockout_window_secs: u64,
    /// Inclusive lower bound of the simulated delay.
    pub latency_min_ms: u64,
    /// Exclusive upper bound of the simulated delay.
    pub latency_max_ms: u64,
    pub token_length: usize,
    /// Empty means the built-in demo accounts.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub accounts: Vec<DemoAccount>,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            lockout_threshold: DEFAULT_LOCKOUT_THRESHOLD,
            lockout_window_secs: DEFAULT_LOCKOUT_WINDOW_SECS.unsigned_abs(),
            latency_min_ms: DEFAULT_LATENCY_MIN_MS,
            latency_max_ms: DEFAULT_LATENCY_MAX_MS,
            token_length: DEFAULT_TOKEN_LENGTH,
            accounts: Vec::new(),
        }
    }
}

// Environment variables may override any scalar setting; accounts only come
// from a config file.
#[derive(Debug, Default, Deserialize)]
struct RawEnvConfig {
    lockout_threshold: Option<u32>,
    lockout_window_secs: Option<u64>,
    latency_min_ms: Option<u64>,
    latency_max_ms: Option<u64>,
    token_length: Option<usize>,
}

impl LoginConfig {
    /// Defaults overridden by `KEYHOLE_*` variables from the process
    /// environment.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides(std::env::vars())
    }

    /// Applies `KEYHOLE_*` overrides from `vars` and validates the result.
    pub fn with_env_overrides<I, K, V>(mut self, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let scoped: Vec<(String, String)> = vars
            .into_iter()
            .filter_map(|(key, value)| {
                key.as_ref()
                    .strip_prefix(ENV_PREFIX)
                    .map(|key| (key.to_owned(), value.as_ref().to_owned()))
            })
            .collect();

        let RawEnvConfig {
            lockout_threshold,
            lockout_window_secs,
            latency_min_ms,
            latency_max_ms,
            token_length,
        } = serde_env::from_iter(scoped).map_err(|e| Error::Env(e.to_string()))?;

        if let Some(threshold) = lockout_threshold {
            info!("Using {ENV_PREFIX}LOCKOUT_THRESHOLD: {threshold}");
            self.lockout_threshold = threshold;
        }
        if let Some(secs) = lockout_window_secs {
            info!("Using {ENV_PREFIX}LOCKOUT_WINDOW_SECS: {secs}");
            self.lockout_window_secs = secs;
        }
        if let Some(ms) = latency_min_ms {
            self.latency_min_ms = ms;
        }
        if let Some(ms) = latency_max_ms {
            self.latency_max_ms = ms;
        }
        if let Some(length) = token_length {
            self.token_length = length;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.lockout_threshold == 0 {
            return Err(Error::invalid_config("lockout_threshold must be at least 1"));
        }
        if self.lockout_window_secs == 0 {
            return Err(Error::invalid_config(
                "lockout_window_secs must be at least 1",
            ));
        }
        self.window()?;
        if self.latency_min_ms > self.latency_max_ms {
            return Err(Error::invalid_config(format!(
                "latency_min_ms ({}) exceeds latency_max_ms ({})",
                self.latency_min_ms, self.latency_max_ms
            )));
        }
        if self.token_length == 0 {
            return Err(Error::invalid_config("token_length must be at least 1"));
        }
        Ok(())
    }

    fn window(&self) -> Result<TimeDelta> {
        if self.lockout_window_secs > MAX_LOCKOUT_WINDOW_SECS {
            return Err(Error::invalid_config(format!(
                "lockout_window_secs must be at most {MAX_LOCKOUT_WINDOW_SECS}"
            )));
        }
        i64::try_from(self.lockout_window_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .ok_or_else(|| Error::invalid_config("lockout_window_secs is out of range"))
    }

    pub fn policy(&self) -> Result<LockoutPolicy> {
        Ok(LockoutPolicy {
            threshold: self.lockout_threshold,
            window: self.window()?,
        })
    }

    pub fn latency(&self) -> RandomLatency {
        RandomLatency::new(self.latency_min_ms..self.latency_max_ms)
    }

    pub fn tokens(&self) -> RandomToken {
        RandomToken::new(self.token_length)
    }

    pub fn directory(&self) -> CredentialDirectory {
        if self.accounts.is_empty() {
            CredentialDirectory::builtin()
        } else {
            CredentialDirectory::new(self.accounts.iter().cloned())
        }
    }

    /// Builds an [`Authenticator`] wired with this configuration and the
    /// system clock.
    pub fn authenticator(&self) -> Result<Authenticator> {
        self.validate()?;
        Ok(Authenticator::new(self.directory())
            .with_policy(self.policy()?)
            .with_latency(self.latency())
            .with_tokens(self.tokens()))
    }
}
