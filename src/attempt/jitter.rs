//! Sources of randomness for backoff jitter.
//!
//! Jitter is injected through [`JitterSource`] rather than read from a global
//! generator, so retry timing can be made deterministic in tests.

use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Produces the random component added to a backoff delay.
pub trait JitterSource: fmt::Debug + Send + Sync {
    /// Return a duration in `[0, bound)`.
    fn sample(&self, bound: Duration) -> Duration;
}

fn sample_micros<R: Rng + ?Sized>(rng: &mut R, bound: Duration) -> Duration {
    let bound_micros = u64::try_from(bound.as_micros()).unwrap_or(u64::MAX);
    if bound_micros == 0 {
        return Duration::ZERO;
    }
    Duration::from_micros(rng.random_range(0..bound_micros))
}

/// Jitter drawn from the thread-local generator. This is the default source.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngJitter;

impl JitterSource for ThreadRngJitter {
    fn sample(&self, bound: Duration) -> Duration {
        sample_micros(&mut rand::rng(), bound)
    }
}

/// Jitter drawn from a seeded generator; the same seed yields the same delays.
///
/// # Examples
///
/// ```rust
/// use caught::{JitterSource, SeededJitter};
/// use std::time::Duration;
///
/// let a = SeededJitter::new(7);
/// let b = SeededJitter::new(7);
/// let bound = Duration::from_millis(1000);
///
/// assert_eq!(a.sample(bound), b.sample(bound));
/// ```
#[derive(Debug)]
pub struct SeededJitter {
    rng: Mutex<StdRng>,
}

impl SeededJitter {
    /// Create a source seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl JitterSource for SeededJitter {
    fn sample(&self, bound: Duration) -> Duration {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        sample_micros(&mut *rng, bound)
    }
}

/// Always returns the same jitter, clamped below the bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedJitter {
    value: Duration,
}

impl FixedJitter {
    /// Create a source that always yields `value`.
    pub fn new(value: Duration) -> Self {
        Self { value }
    }
}

impl JitterSource for FixedJitter {
    fn sample(&self, bound: Duration) -> Duration {
        if self.value < bound {
            self.value
        } else {
            bound.saturating_sub(Duration::from_micros(1))
        }
    }
}
