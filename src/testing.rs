//! Testing utilities for code that runs attempts.
//!
//! This module provides a scripted producer for exercising retry behavior and
//! assertion macros for the two branches of a result.
//!
//! # Examples
//!
//! ## Flaky producer
//!
//! ```rust
//! use caught::testing::Flaky;
//! use caught::Attempt;
//!
//! # tokio_test::block_on(async {
//! let flaky = Flaky::new(2, "ok", "transient");
//!
//! let result = Attempt::from_fn(flaky.producer()).with_retry(3).await;
//!
//! assert_eq!(result, Ok("ok"));
//! assert_eq!(flaky.calls(), 3);
//! # });
//! ```
//!
//! ## Assertion Macros
//!
//! ```rust
//! use caught::{assert_data, assert_error};
//!
//! let ok: Result<i32, String> = Ok(42);
//! assert_eq!(assert_data!(ok), 42);
//!
//! let err: Result<i32, String> = Err("boom".to_string());
//! assert_error!(err, "boom".to_string());
//! ```

use std::future::{ready, Ready};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// A scripted operation that fails a fixed number of times, then succeeds.
///
/// Clones share the call counter, so a producer handed to an attempt can be
/// inspected afterwards.
#[derive(Debug, Clone)]
pub struct Flaky<T, E> {
    calls: Arc<AtomicU32>,
    failures: u32,
    value: T,
    error: E,
}

impl<T: Clone, E: Clone> Flaky<T, E> {
    /// Fail the first `failures` calls with `error`, then return `value`.
    pub fn new(failures: u32, value: T, error: E) -> Self {
        Self {
            calls: Arc::new(AtomicU32::new(0)),
            failures,
            value,
            error,
        }
    }

    /// Fail every call with `error`.
    pub fn always_failing(error: E) -> Self
    where
        T: Default,
    {
        Self::new(u32::MAX, T::default(), error)
    }

    /// Number of calls so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Perform one call synchronously.
    pub fn call(&self) -> Result<T, E> {
        let previous = self.calls.fetch_add(1, Ordering::SeqCst);
        if previous < self.failures {
            Err(self.error.clone())
        } else {
            Ok(self.value.clone())
        }
    }

    /// A producer suitable for [`Attempt::from_fn`](crate::Attempt::from_fn).
    pub fn producer(&self) -> impl FnMut() -> Ready<Result<T, E>> + Send + 'static
    where
        T: Send + 'static,
        E: Send + 'static,
    {
        let flaky = self.clone();
        move || ready(flaky.call())
    }
}

/// Assert that a result is `Ok`, evaluating to the data.
///
/// With a second argument, also assert the data equals it.
///
/// # Example
///
/// ```rust
/// use caught::assert_data;
///
/// let result: Result<_, String> = Ok(7);
/// assert_data!(result, 7);
/// ```
#[macro_export]
macro_rules! assert_data {
    ($result:expr) => {
        match $result {
            Ok(data) => data,
            Err(e) => panic!("Expected data, got error: {:?}", e),
        }
    };
    ($result:expr, $expected:expr) => {
        assert_eq!($crate::assert_data!($result), $expected)
    };
}

/// Assert that a result is `Err`, evaluating to the error.
///
/// With a second argument, also assert the error equals it.
///
/// # Example
///
/// ```rust
/// use caught::assert_error;
///
/// let result: Result<i32, _> = Err("nope");
/// assert_eq!(assert_error!(result), "nope");
/// ```
#[macro_export]
macro_rules! assert_error {
    ($result:expr) => {
        match $result {
            Err(e) => e,
            Ok(data) => panic!("Expected error, got data: {:?}", data),
        }
    };
    ($result:expr, $expected:expr) => {
        assert_eq!($crate::assert_error!($result), $expected)
    };
}

#[cfg(feature = "proptest")]
use proptest::prelude::*;

#[cfg(feature = "proptest")]
impl Arbitrary for crate::BackoffConfig {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        use std::time::Duration;

        (
            proptest::option::of(0u64..10_000),
            proptest::option::of(any::<bool>()),
            proptest::option::of(0u64..60_000),
            proptest::option::of(any::<bool>()),
        )
            .prop_map(|(base, exponential, max, jitter)| {
                let mut config = crate::BackoffConfig::new();
                if let Some(base) = base {
                    config = config.with_base_delay(Duration::from_millis(base));
                }
                if let Some(exponential) = exponential {
                    config = config.with_exponential(exponential);
                }
                if let Some(max) = max {
                    config = config.with_max_delay(Duration::from_millis(max));
                }
                if let Some(jitter) = jitter {
                    config = config.with_jitter(jitter);
                }
                config
            })
            .boxed()
    }
}
