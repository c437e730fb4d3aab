//! Backoff configuration for delays between retry attempts.

use std::time::Duration;

use super::jitter::JitterSource;

/// Cap applied to computed delays when no `max_delay` is set.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(30_000);

/// Upper bound (exclusive) of the random component added by jitter.
pub const JITTER_RANGE: Duration = Duration::from_millis(1_000);

/// Describes how the delay between attempts is computed.
///
/// Backoff is pure data. Every field is optional so that partial configs can
/// be merged: [`BackoffConfig::merge`] keeps the existing value for any field
/// the newer config leaves unset.
///
/// Delays are computed for the attempt that just failed (1-indexed):
///
/// - linear: `base * attempt`
/// - exponential: `base * 2^(attempt - 1)`
///
/// The result is capped at `max_delay` (30s by default). When jitter is on, a
/// random value in `[0, 1000ms)` is added *after* the cap, so the actual wait
/// may exceed the cap by up to a second.
///
/// # Examples
///
/// ```rust
/// use caught::BackoffConfig;
/// use std::time::Duration;
///
/// let backoff = BackoffConfig::exponential(Duration::from_millis(100))
///     .with_max_delay(Duration::from_millis(500));
///
/// assert_eq!(backoff.delay_for_attempt(1), Some(Duration::from_millis(100)));
/// assert_eq!(backoff.delay_for_attempt(2), Some(Duration::from_millis(200)));
/// assert_eq!(backoff.delay_for_attempt(3), Some(Duration::from_millis(400)));
/// assert_eq!(backoff.delay_for_attempt(4), Some(Duration::from_millis(500))); // capped
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BackoffConfig {
    #[cfg_attr(
        feature = "serde",
        serde(
            rename = "base_delay_ms",
            with = "crate::attempt::settings::millis",
            skip_serializing_if = "Option::is_none"
        )
    )]
    base_delay: Option<Duration>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    exponential: Option<bool>,
    #[cfg_attr(
        feature = "serde",
        serde(
            rename = "max_delay_ms",
            with = "crate::attempt::settings::millis",
            skip_serializing_if = "Option::is_none"
        )
    )]
    max_delay: Option<Duration>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    jitter: Option<bool>,
}

impl BackoffConfig {
    /// An empty config: no base delay, so attempts run back to back.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay grows linearly: `base * attempt`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use caught::BackoffConfig;
    /// use std::time::Duration;
    ///
    /// let backoff = BackoffConfig::linear(Duration::from_millis(100));
    ///
    /// assert_eq!(backoff.delay_for_attempt(1), Some(Duration::from_millis(100)));
    /// assert_eq!(backoff.delay_for_attempt(2), Some(Duration::from_millis(200)));
    /// assert_eq!(backoff.delay_for_attempt(3), Some(Duration::from_millis(300)));
    /// ```
    pub fn linear(base: Duration) -> Self {
        Self {
            base_delay: Some(base),
            exponential: Some(false),
            ..Self::default()
        }
    }

    /// Delay doubles: `base * 2^(attempt - 1)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use caught::BackoffConfig;
    /// use std::time::Duration;
    ///
    /// let backoff = BackoffConfig::exponential(Duration::from_millis(100));
    ///
    /// assert_eq!(backoff.delay_for_attempt(1), Some(Duration::from_millis(100)));
    /// assert_eq!(backoff.delay_for_attempt(2), Some(Duration::from_millis(200)));
    /// assert_eq!(backoff.delay_for_attempt(3), Some(Duration::from_millis(400)));
    /// ```
    pub fn exponential(base: Duration) -> Self {
        Self {
            base_delay: Some(base),
            exponential: Some(true),
            ..Self::default()
        }
    }

    /// Set the base delay.
    pub fn with_base_delay(mut self, base: Duration) -> Self {
        self.base_delay = Some(base);
        self
    }

    /// Choose exponential (`true`) or linear (`false`) growth.
    pub fn with_exponential(mut self, exponential: bool) -> Self {
        self.exponential = Some(exponential);
        self
    }

    /// Set the cap applied before jitter.
    pub fn with_max_delay(mut self, max: Duration) -> Self {
        self.max_delay = Some(max);
        self
    }

    /// Enable or disable additive jitter.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = Some(jitter);
        self
    }

    /// Get the base delay, if one is set.
    pub fn base_delay(&self) -> Option<Duration> {
        self.base_delay
    }

    /// Whether delays grow exponentially. Linear when unset.
    pub fn is_exponential(&self) -> bool {
        self.exponential.unwrap_or(false)
    }

    /// The effective cap, [`DEFAULT_MAX_DELAY`] when unset.
    pub fn max_delay(&self) -> Duration {
        self.max_delay.unwrap_or(DEFAULT_MAX_DELAY)
    }

    /// Whether jitter is added to computed delays.
    pub fn has_jitter(&self) -> bool {
        self.jitter.unwrap_or(false)
    }

    /// Shallow merge: fields set on `newer` win, unset fields keep `self`'s value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use caught::BackoffConfig;
    /// use std::time::Duration;
    ///
    /// let merged = BackoffConfig::linear(Duration::from_millis(100))
    ///     .merge(BackoffConfig::new().with_jitter(true));
    ///
    /// assert_eq!(merged.base_delay(), Some(Duration::from_millis(100)));
    /// assert!(merged.has_jitter());
    /// ```
    pub fn merge(self, newer: BackoffConfig) -> Self {
        Self {
            base_delay: newer.base_delay.or(self.base_delay),
            exponential: newer.exponential.or(self.exponential),
            max_delay: newer.max_delay.or(self.max_delay),
            jitter: newer.jitter.or(self.jitter),
        }
    }

    /// Delay after the given failed attempt (1-indexed), before jitter.
    ///
    /// Returns `None` when no base delay is configured. A zero base delay
    /// counts as unset.
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        let base = self.base_delay.filter(|base| !base.is_zero())?;
        let attempt = attempt.max(1);

        let delay = if self.is_exponential() {
            base.saturating_mul(2u32.saturating_pow(attempt - 1))
        } else {
            base.saturating_mul(attempt)
        };

        Some(delay.min(self.max_delay()))
    }

    /// Delay after the given failed attempt with jitter applied.
    ///
    /// This is what the attempt loop sleeps for.
    pub fn delay_with_jitter(&self, attempt: u32, source: &dyn JitterSource) -> Option<Duration> {
        let delay = self.delay_for_attempt(attempt)?;
        if self.has_jitter() {
            Some(delay.saturating_add(source.sample(JITTER_RANGE)))
        } else {
            Some(delay)
        }
    }
}
