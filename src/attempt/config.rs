//! Execution configuration carried by an [`Attempt`](super::Attempt).

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::backoff::BackoffConfig;
use super::jitter::{JitterSource, ThreadRngJitter};
use super::settings::RetrySettings;
use crate::error::TimeoutError;

pub(crate) type TimeoutErrorFn<E> = Arc<dyn Fn(Duration) -> E + Send + Sync>;
type RetryHook<E> = Arc<dyn Fn(&RetryEvent<'_, E>) + Send + Sync>;

/// Information about a failed attempt that is about to be retried.
#[derive(Debug, Clone)]
pub struct RetryEvent<'a, E> {
    /// Which attempt just failed (1-indexed).
    pub attempt: u32,
    /// The error from the failed attempt.
    pub error: &'a E,
    /// Delay before the next attempt, `None` when retrying immediately.
    pub next_delay: Option<Duration>,
    /// Total elapsed time since the first attempt started.
    pub elapsed: Duration,
}

struct TimeoutPolicy<E> {
    duration: Duration,
    error: TimeoutErrorFn<E>,
}

impl<E> Clone for TimeoutPolicy<E> {
    fn clone(&self) -> Self {
        Self {
            duration: self.duration,
            error: Arc::clone(&self.error),
        }
    }
}

/// How attempts are run: timeout, retry count, backoff and hooks.
///
/// The config is an immutable value. Every `with_*` method consumes it and
/// returns a new config; setting the same option twice keeps the last value.
/// Cloning is cheap and shares hooks and the jitter source through `Arc`, so
/// one config can drive any number of independent executions.
///
/// # Examples
///
/// ```rust
/// use caught::{BackoffConfig, ExecutionConfig};
/// use std::time::Duration;
///
/// let config = ExecutionConfig::<String>::new()
///     .with_timeout(Duration::from_secs(1))
///     .with_retry(3)
///     .with_backoff(BackoffConfig::exponential(Duration::from_millis(100)));
///
/// assert_eq!(config.timeout(), Some(Duration::from_secs(1)));
/// assert_eq!(config.max_attempts(), 4);
/// ```
pub struct ExecutionConfig<E> {
    timeout: Option<TimeoutPolicy<E>>,
    max_retries: u32,
    backoff: BackoffConfig,
    jitter_source: Arc<dyn JitterSource>,
    on_retry: Option<RetryHook<E>>,
}

impl<E> ExecutionConfig<E> {
    /// Single attempt, no timeout, no backoff.
    pub fn new() -> Self {
        Self {
            timeout: None,
            max_retries: 0,
            backoff: BackoffConfig::default(),
            jitter_source: Arc::new(ThreadRngJitter),
            on_retry: None,
        }
    }

    /// Fail an attempt with the default [`TimeoutError`] if it runs longer
    /// than `duration`.
    ///
    /// Replaces any previously configured timeout and timeout error.
    pub fn with_timeout(mut self, duration: Duration) -> Self
    where
        E: From<TimeoutError> + 'static,
    {
        self.timeout = Some(TimeoutPolicy {
            duration,
            error: Arc::new(|elapsed: Duration| E::from(TimeoutError::new(elapsed))),
        });
        self
    }

    /// Fail an attempt with `error` if it runs longer than `duration`.
    pub fn with_timeout_error(mut self, duration: Duration, error: E) -> Self
    where
        E: Clone + Send + Sync + 'static,
    {
        self.timeout = Some(TimeoutPolicy {
            duration,
            error: Arc::new(move |_: Duration| error.clone()),
        });
        self
    }

    /// Allow up to `max_retries` additional attempts after the first failure.
    pub fn with_retry(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Merge backoff options into the current backoff.
    ///
    /// Only takes effect when retries are configured.
    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = self.backoff.merge(backoff);
        self
    }

    /// Replace the source of jitter randomness.
    pub fn with_jitter_source(mut self, source: impl JitterSource + 'static) -> Self {
        self.jitter_source = Arc::new(source);
        self
    }

    /// Call `hook` after each failed attempt that will be retried.
    ///
    /// The hook runs synchronously before the backoff delay; keep it cheap.
    pub fn with_on_retry<H>(mut self, hook: H) -> Self
    where
        H: Fn(&RetryEvent<'_, E>) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(hook));
        self
    }

    /// Apply loaded settings on top of this config.
    ///
    /// A timeout in the settings uses the default [`TimeoutError`]; retries
    /// are replaced and backoff is merged.
    pub fn with_settings(self, settings: RetrySettings) -> Self
    where
        E: From<TimeoutError> + 'static,
    {
        let config = match settings.timeout {
            Some(duration) => self.with_timeout(duration),
            None => self,
        };
        config
            .with_retry(settings.max_retries)
            .with_backoff(settings.backoff)
    }

    /// Build a config from loaded settings alone.
    pub fn from_settings(settings: RetrySettings) -> Self
    where
        E: From<TimeoutError> + 'static,
    {
        Self::new().with_settings(settings)
    }

    /// The per-attempt timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.as_ref().map(|policy| policy.duration)
    }

    /// Number of retries after the first attempt.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Total number of attempts, always at least one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// The backoff applied between attempts.
    pub fn backoff(&self) -> &BackoffConfig {
        &self.backoff
    }

    /// The configured jitter source.
    pub fn jitter_source(&self) -> &dyn JitterSource {
        &*self.jitter_source
    }

    pub(crate) fn timeout_error(&self) -> Option<(Duration, &TimeoutErrorFn<E>)> {
        self.timeout.as_ref().map(|policy| (policy.duration, &policy.error))
    }

    pub(crate) fn notify_retry(&self, event: &RetryEvent<'_, E>) {
        if let Some(hook) = &self.on_retry {
            hook(event);
        }
    }
}

impl<E> Default for ExecutionConfig<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for ExecutionConfig<E> {
    fn clone(&self) -> Self {
        Self {
            timeout: self.timeout.clone(),
            max_retries: self.max_retries,
            backoff: self.backoff,
            jitter_source: Arc::clone(&self.jitter_source),
            on_retry: self.on_retry.clone(),
        }
    }
}

impl<E> fmt::Debug for ExecutionConfig<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionConfig")
            .field("timeout", &self.timeout())
            .field("max_retries", &self.max_retries)
            .field("backoff", &self.backoff)
            .field("jitter_source", &self.jitter_source)
            .field("on_retry", &self.on_retry.as_ref().map(|_| "<hook>"))
            .finish()
    }
}
