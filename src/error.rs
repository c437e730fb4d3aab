//! Error types produced while running attempts.
//!
//! - [`TimeoutError`]: the synthetic failure produced when a timer wins the race
//!   against an attempt.
//! - [`Error`]: the default, type-erased error kind used when callers don't need
//!   a custom error type.

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

/// A boxed, thread-safe standard error.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Error produced when an attempt does not settle before its timeout.
///
/// Its message is always `Operation timed out after {ms}ms`.
///
/// # Examples
///
/// ```rust
/// use caught::TimeoutError;
/// use std::time::Duration;
///
/// let err = TimeoutError::new(Duration::from_millis(50));
/// assert_eq!(err.to_string(), "Operation timed out after 50ms");
/// assert_eq!(err.duration(), Duration::from_millis(50));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutError {
    duration: Duration,
}

impl TimeoutError {
    /// Create a timeout error for the given duration.
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    /// The timeout duration that was exceeded.
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for TimeoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Operation timed out after {}ms",
            self.duration.as_millis()
        )
    }
}

impl StdError for TimeoutError {}

impl From<TimeoutError> for String {
    fn from(err: TimeoutError) -> Self {
        err.to_string()
    }
}

/// The default error kind.
///
/// Wraps any `std::error::Error + Send + Sync` so that `?` works on mixed
/// error sources. Timeouts can be told apart with [`Error::is_timeout`].
///
/// `Error` must not implement `std::error::Error`: the blanket `From`
/// conversion below would overlap with `From<T> for T`.
///
/// # Examples
///
/// ```rust
/// use caught::{Error, TimeoutError};
/// use std::time::Duration;
///
/// let err: Error = TimeoutError::new(Duration::from_millis(10)).into();
/// assert!(err.is_timeout());
///
/// let err = Error::msg("connection reset");
/// assert!(!err.is_timeout());
/// assert_eq!(err.to_string(), "connection reset");
/// ```
pub struct Error {
    inner: BoxError,
}

impl Error {
    /// Create an error from a plain message.
    pub fn msg(message: impl fmt::Display) -> Self {
        Self {
            inner: Box::new(Message(message.to_string())),
        }
    }

    /// Returns true if this error was produced by a timeout.
    pub fn is_timeout(&self) -> bool {
        self.inner.is::<TimeoutError>()
    }

    /// Attempt to downcast to a concrete error type.
    pub fn downcast_ref<T: StdError + 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Extract the boxed error.
    pub fn into_inner(self) -> BoxError {
        self.inner
    }
}

impl<E> From<E> for Error
where
    E: StdError + Send + Sync + 'static,
{
    fn from(err: E) -> Self {
        Self {
            inner: Box::new(err),
        }
    }
}

impl From<Error> for BoxError {
    fn from(err: Error) -> Self {
        err.inner
    }
}

impl AsRef<dyn StdError + Send + Sync> for Error {
    fn as_ref(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.inner
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

#[derive(Debug)]
struct Message(String);

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for Message {}
