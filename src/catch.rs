//! The entry point: turn any fallible operation into a `Result` or an
//! [`Attempt`].
//!
//! [`catch`] accepts three kinds of input and classifies them by type:
//!
//! | Input | Returns |
//! |-------|---------|
//! | `FnOnce() -> Result<T, E>` | `Result<T, E>`, immediately |
//! | `FnMut() -> impl Future<Output = Result<T, E>>` | retryable [`Attempt`] |
//! | `impl Future<Output = Result<T, E>>` | single-attempt [`Attempt`] |
//!
//! Functions are always invoked eagerly, exactly once, and classified by what
//! they return. Anything else does not compile.
//!
//! # Examples
//!
//! ```rust
//! use caught::catch;
//!
//! // Synchronous: the result comes back immediately.
//! let parsed = catch(|| "42".parse::<i32>());
//! assert_eq!(parsed, Ok(42));
//!
//! let failed = catch(|| "forty-two".parse::<i32>());
//! assert!(failed.is_err());
//! ```
//!
//! ```rust
//! use caught::catch;
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! // Asynchronous: configure, then await.
//! let result = catch(|| async { Ok::<_, String>("pong") })
//!     .with_timeout(Duration::from_secs(1))
//!     .with_retry(2)
//!     .await;
//!
//! assert_eq!(result, Ok("pong"));
//! # });
//! ```

use std::future::Future;

use crate::attempt::{Attempt, Pending, Producer, Retryable};

/// Type-level tags telling [`Catchable`] implementations apart.
pub mod marker {
    /// A function returning a `Result` directly.
    #[derive(Debug)]
    pub enum Immediate {}

    /// A future that has already been created.
    #[derive(Debug)]
    pub enum InFlight {}

    /// A function returning a future; can be invoked again for retries.
    #[derive(Debug)]
    pub enum Restartable {}
}

/// Inputs accepted by [`catch`].
///
/// `Marker` only exists so the three implementations don't overlap; it is
/// always inferred.
pub trait Catchable<Marker> {
    /// What `catch` returns for this input.
    type Output;

    /// Invoke or wrap the input.
    fn catch(self) -> Self::Output;
}

impl<F, T, E> Catchable<marker::Immediate> for F
where
    F: FnOnce() -> Result<T, E>,
{
    type Output = Result<T, E>;

    fn catch(self) -> Result<T, E> {
        self()
    }
}

impl<Fut, T, E> Catchable<marker::InFlight> for Fut
where
    Fut: Future<Output = Result<T, E>>,
{
    type Output = Attempt<Pending<Fut>, E>;

    fn catch(self) -> Self::Output {
        Attempt::from_future(self)
    }
}

impl<F, Fut, T, E> Catchable<marker::Restartable> for F
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    type Output = Attempt<Retryable<Producer<F>, Fut>, E>;

    fn catch(self) -> Self::Output {
        Attempt::from_fn(self)
    }
}

/// Run or wrap a fallible operation without letting its failure escape.
///
/// See the [module docs](self) for how inputs are classified.
pub fn catch<I, M>(input: I) -> I::Output
where
    I: Catchable<M>,
{
    input.catch()
}

/// Invoke a synchronous operation and return its result.
///
/// Equivalent to `catch` for functions returning `Result`, for call sites
/// where inference needs a hint.
pub fn catch_sync<T, E>(operation: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
    operation()
}
