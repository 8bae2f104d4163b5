//! Simulated network latency for login attempts.

use std::ops::Range;
use std::time::Duration;

use rand::Rng as _;

/// Lower bound of the default simulated delay, inclusive.
pub const DEFAULT_LATENCY_MIN_MS: u64 = 700;
/// Upper bound of the default simulated delay, exclusive.
pub const DEFAULT_LATENCY_MAX_MS: u64 = 1200;

/// Picks how long an attempt waits before it is evaluated.
pub trait Latency: Send + Sync {
    fn next_delay(&self) -> Duration;
}

/// Uniformly random delay from a half-open millisecond range.
#[derive(Debug, Clone)]
pub struct RandomLatency {
    millis: Range<u64>,
}

impl RandomLatency {
    /// An empty range degenerates to a fixed delay of `range.start`.
    pub fn new(millis: Range<u64>) -> Self {
        Self { millis }
    }

    pub fn range(&self) -> Range<u64> {
        self.millis.clone()
    }
}

impl Default for RandomLatency {
    fn default() -> Self {
        Self::new(DEFAULT_LATENCY_MIN_MS..DEFAULT_LATENCY_MAX_MS)
    }
}

impl Latency for RandomLatency {
    fn next_delay(&self) -> Duration {
        if self.millis.is_empty() {
            return Duration::from_millis(self.millis.start);
        }
        Duration::from_millis(rand::thread_rng().gen_range(self.millis.clone()))
    }
}

/// Always the same delay. `FixedLatency::default()` does not wait at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedLatency(pub Duration);

impl Latency for FixedLatency {
    fn next_delay(&self) -> Duration {
        self.0
    }
}
