//! Mock session tokens handed out on a successful login.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::{Rng as _, distributions::Alphanumeric};

/// Default number of random characters in a token.
pub const DEFAULT_TOKEN_LENGTH: usize = 32;

const TOKEN_PREFIX: &str = "mock_";

/// Produces opaque token strings.
pub trait TokenSource: Send + Sync {
    fn issue(&self) -> String;
}

/// Random alphanumeric tokens.
///
/// These are not session credentials and carry no cryptographic guarantee;
/// they only need to differ from call to call.
#[derive(Debug, Clone, Copy)]
pub struct RandomToken {
    length: usize,
}

impl RandomToken {
    pub fn new(length: usize) -> Self {
        Self {
            length: length.max(1),
        }
    }
}

impl Default for RandomToken {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_LENGTH)
    }
}

impl TokenSource for RandomToken {
    fn issue(&self) -> String {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(self.length)
            .map(char::from)
            .collect();
        format!("{TOKEN_PREFIX}{suffix}")
    }
}

/// Deterministic tokens (`token-1`, `token-2`, ...).
#[derive(Debug, Default)]
pub struct SequentialToken {
    next: AtomicU64,
}

impl TokenSource for SequentialToken {
    fn issue(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        format!("token-{n}")
    }
}
