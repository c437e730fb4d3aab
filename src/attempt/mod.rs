//! The configurable async handle and everything it runs.
//!
//! An [`Attempt`] pairs a source of futures with an [`ExecutionConfig`].
//! Configuration is chained before anything runs; awaiting the handle runs the
//! attempt loop and always resolves to a `Result`.
//!
//! # Quick Start
//!
//! ```rust
//! use caught::{Attempt, BackoffConfig};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let result = Attempt::from_fn(|| async { Ok::<_, String>(42) })
//!     .with_timeout(Duration::from_secs(1))
//!     .with_retry(3)
//!     .with_backoff(BackoffConfig::exponential(Duration::from_millis(100)))
//!     .await;
//!
//! assert_eq!(result, Ok(42));
//! # });
//! ```
//!
//! # Retrying requires a producer
//!
//! A future can only be awaited once, so an attempt built from a bare future
//! ([`Pending`]) supports timeouts but has no `with_retry` or `with_backoff`:
//!
//! ```rust,compile_fail
//! use caught::Attempt;
//!
//! let attempt = Attempt::from_future(async { Ok::<_, String>(1) }).with_retry(3);
//! ```
//!
//! Build from a function ([`Retryable`]) to retry: every attempt after the
//! first calls the function again for a fresh future.

mod backoff;
mod config;
mod execute;
mod jitter;
pub(crate) mod settings;
mod signal;
mod source;

pub use backoff::{BackoffConfig, DEFAULT_MAX_DELAY, JITTER_RANGE};
pub use config::{ExecutionConfig, RetryEvent};
pub use execute::{execute, AttemptFuture};
pub use jitter::{FixedJitter, JitterSource, SeededJitter, ThreadRngJitter};
pub use settings::RetrySettings;
pub use signal::CancelSignal;
pub use source::{CancellableProducer, Exhausted, Pending, Produce, Producer, Retryable, Source};

use std::fmt;
use std::future::{Future, IntoFuture};
use std::time::Duration;

use crate::error::TimeoutError;

/// A deferred, configurable unit of work.
///
/// Each `with_*` method consumes the handle and returns a new one with merged
/// configuration; nothing runs until the handle is awaited (or [`run`] is
/// called). Awaiting always resolves to `Result<T, E>`: failures, timeouts
/// and exhausted retries all land in `Err`.
///
/// Awaiting produces an [`AttemptFuture`], which borrows nothing beyond what
/// the operation itself borrows and is only `Send` when the operation's
/// futures are. Closures over local state and futures holding an `Rc` can be
/// awaited directly:
///
/// ```rust
/// use caught::catch;
/// use std::rc::Rc;
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let prefix = String::from("id-");
/// let shared = Rc::new(7);
///
/// let result = catch(|| {
///     let shared = Rc::clone(&shared);
///     let prefix = &prefix;
///     async move {
///         tokio::task::yield_now().await;
///         Ok::<_, String>(format!("{}{}", prefix, shared))
///     }
/// })
/// .with_timeout(Duration::from_secs(1))
/// .with_retry(2)
/// .await;
///
/// assert_eq!(result, Ok("id-7".to_string()));
/// # });
/// ```
///
/// [`run`]: Attempt::run
pub struct Attempt<S, E> {
    source: S,
    config: ExecutionConfig<E>,
}

impl<Fut, T, E> Attempt<Pending<Fut>, E>
where
    Fut: Future<Output = Result<T, E>>,
{
    /// Wrap an already-created future. Supports a single attempt.
    pub fn from_future(future: Fut) -> Self {
        Self {
            source: Pending { future },
            config: ExecutionConfig::new(),
        }
    }

    /// Run the single attempt. Same as awaiting the handle.
    pub fn run(self) -> AttemptFuture<Exhausted<Fut>, E, ExecutionConfig<E>> {
        let first = (self.source.future, CancelSignal::new());
        AttemptFuture::new(first, Exhausted::new(), self.config)
    }
}

impl<F, Fut, T, E> Attempt<Retryable<Producer<F>, Fut>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    /// Wrap a producer. It is invoked once immediately; the resulting future
    /// is the first attempt, and later attempts invoke it again.
    pub fn from_fn(producer: F) -> Self {
        Self {
            source: Retryable::start(Producer(producer)),
            config: ExecutionConfig::new(),
        }
    }
}

impl<F, Fut, T, E> Attempt<Retryable<CancellableProducer<F>, Fut>, E>
where
    F: FnMut(CancelSignal) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    /// Wrap a producer that receives a [`CancelSignal`] per attempt.
    ///
    /// The signal is triggered when that attempt loses its timeout race.
    pub fn from_fn_cancellable(producer: F) -> Self {
        Self {
            source: Retryable::start(CancellableProducer(producer)),
            config: ExecutionConfig::new(),
        }
    }
}

impl<S, E> Attempt<S, E> {
    /// The current configuration.
    pub fn config(&self) -> &ExecutionConfig<E> {
        &self.config
    }

    /// Fail each attempt with the default [`TimeoutError`] after `duration`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use caught::catch;
    /// use std::time::Duration;
    ///
    /// # tokio_test::block_on(async {
    /// let result = catch(async {
    ///     tokio::time::sleep(Duration::from_secs(10)).await;
    ///     Ok::<_, String>(42)
    /// })
    /// .with_timeout(Duration::from_millis(10))
    /// .await;
    ///
    /// assert_eq!(result, Err("Operation timed out after 10ms".to_string()));
    /// # });
    /// ```
    pub fn with_timeout(self, duration: Duration) -> Self
    where
        E: From<TimeoutError> + 'static,
    {
        self.map_config(|config| config.with_timeout(duration))
    }

    /// Fail each attempt with `error` after `duration`.
    pub fn with_timeout_error(self, duration: Duration, error: E) -> Self
    where
        E: Clone + Send + Sync + 'static,
    {
        self.map_config(|config| config.with_timeout_error(duration, error))
    }

    fn map_config(self, f: impl FnOnce(ExecutionConfig<E>) -> ExecutionConfig<E>) -> Self {
        Self {
            source: self.source,
            config: f(self.config),
        }
    }
}

impl<P, Fut, T, E> Attempt<Retryable<P, Fut>, E>
where
    P: Produce<Future = Fut>,
    Fut: Future<Output = Result<T, E>>,
{
    /// Allow up to `max_retries` additional attempts after the first failure.
    pub fn with_retry(self, max_retries: u32) -> Self {
        self.map_config(|config| config.with_retry(max_retries))
    }

    /// Merge backoff options. Only observable when retries are configured.
    pub fn with_backoff(self, backoff: BackoffConfig) -> Self {
        self.map_config(|config| config.with_backoff(backoff))
    }

    /// Replace the jitter randomness, e.g. with a [`SeededJitter`].
    pub fn with_jitter_source(self, source: impl JitterSource + 'static) -> Self {
        self.map_config(|config| config.with_jitter_source(source))
    }

    /// Observe each failed attempt that is about to be retried.
    pub fn with_on_retry<H>(self, hook: H) -> Self
    where
        H: Fn(&RetryEvent<'_, E>) + Send + Sync + 'static,
    {
        self.map_config(|config| config.with_on_retry(hook))
    }

    /// Apply loaded [`RetrySettings`].
    pub fn with_settings(self, settings: RetrySettings) -> Self
    where
        E: From<TimeoutError> + 'static,
    {
        self.map_config(|config| config.with_settings(settings))
    }

    /// Replace the whole configuration.
    pub fn with_config(self, config: ExecutionConfig<E>) -> Self {
        self.map_config(|_| config)
    }

    /// Run the attempt loop. Same as awaiting the handle.
    pub fn run(self) -> AttemptFuture<P, E, ExecutionConfig<E>> {
        let Retryable { producer, first } = self.source;
        AttemptFuture::new(first, producer, self.config)
    }
}

impl<Fut, T, E> IntoFuture for Attempt<Pending<Fut>, E>
where
    Fut: Future<Output = Result<T, E>>,
{
    type Output = Result<T, E>;
    type IntoFuture = AttemptFuture<Exhausted<Fut>, E, ExecutionConfig<E>>;

    fn into_future(self) -> Self::IntoFuture {
        self.run()
    }
}

impl<P, Fut, T, E> IntoFuture for Attempt<Retryable<P, Fut>, E>
where
    P: Produce<Future = Fut>,
    Fut: Future<Output = Result<T, E>>,
{
    type Output = Result<T, E>;
    type IntoFuture = AttemptFuture<P, E, ExecutionConfig<E>>;

    fn into_future(self) -> Self::IntoFuture {
        self.run()
    }
}

impl<S: fmt::Debug, E> fmt::Debug for Attempt<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attempt")
            .field("source", &self.source)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests;
