//! Retry policy — exponential backoff with injectable jitter.
//!
//! ```text
//! delay(attempt) = min(base_delay * 2^attempt, max_delay)
//! wait(attempt)  = delay(attempt) + uniform(0, delay(attempt) * jitter_ratio)
//! ```

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use pulse_core::{PulseError, PulseResult};

/// Bounds on how a single job is retried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Total attempts = `max_retries + 1`.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Upper bound of the jitter as a fraction of the backoff, in [0, 1].
    pub jitter_ratio: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            jitter_ratio: 0.25,
        }
    }
}

impl RetryPolicy {
    pub fn validate(&self) -> PulseResult<()> {
        if self.base_delay.is_zero() {
            return Err(PulseError::InvalidInput("base delay must be positive".into()));
        }
        if self.max_delay < self.base_delay {
            return Err(PulseError::InvalidInput(format!(
                "max delay {:?} is below base delay {:?}",
                self.max_delay, self.base_delay
            )));
        }
        if !(0.0..=1.0).contains(&self.jitter_ratio) {
            return Err(PulseError::InvalidInput(format!(
                "jitter ratio must be in [0, 1], got {}",
                self.jitter_ratio
            )));
        }
        Ok(())
    }

    /// Capped exponential delay before retrying after `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    /// Backoff for `attempt` plus a jitter drawn from `jitter`.
    pub fn delay_with_jitter(&self, attempt: u32, jitter: &mut impl Jitter) -> Duration {
        let backoff = self.backoff(attempt);
        let bound = scale(backoff, self.jitter_ratio);
        backoff.saturating_add(jitter.sample(bound).min(bound))
    }

    /// Whether a retryable failure on `attempt` (0-based) may be retried.
    pub fn allows_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}

/// `d * factor` for a factor in [0, 1]; falls back to `d` where the
/// float product rounds past `Duration::MAX`.
fn scale(d: Duration, factor: f64) -> Duration {
    Duration::try_from_secs_f64(d.as_secs_f64() * factor).map_or(d, |scaled| scaled.min(d))
}

/// Source of randomness for backoff jitter.
pub trait Jitter {
    /// A value in `[0, bound]`.
    fn sample(&mut self, bound: Duration) -> Duration;
}

/// Uniform jitter from any [`rand::Rng`].
pub struct RngJitter<R>(pub R);

impl RngJitter<rand::rngs::ThreadRng> {
    pub fn thread() -> Self {
        Self(rand::thread_rng())
    }
}

impl<R: Rng> Jitter for RngJitter<R> {
    fn sample(&mut self, bound: Duration) -> Duration {
        if bound.is_zero() {
            return Duration::ZERO;
        }
        let nanos = self.0.gen_range(0..=bound.as_nanos().min(u64::MAX as u128) as u64);
        Duration::from_nanos(nanos)
    }
}

/// Always zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl Jitter for NoJitter {
    fn sample(&mut self, _bound: Duration) -> Duration {
        Duration::ZERO
    }
}

/// A fixed fraction of the bound, for deterministic timing.
#[derive(Debug, Clone, Copy)]
pub struct FixedJitter(pub f64);

impl Jitter for FixedJitter {
    fn sample(&mut self, bound: Duration) -> Duration {
        scale(bound, self.0.clamp(0.0, 1.0))
    }
}
