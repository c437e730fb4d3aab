//! # Caught
//!
//! Run fallible operations, sync or async, and always get a `Result` back.
//!
//! Synchronous functions are invoked on the spot. Asynchronous work becomes an
//! [`Attempt`]: a deferred handle you can give a timeout, a retry budget and a
//! backoff policy before awaiting it.
//!
//! ## Quick Example
//!
//! ```rust
//! use caught::{catch, BackoffConfig};
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! // Sync: returned immediately
//! let port = catch(|| "8080".parse::<u16>());
//! assert_eq!(port, Ok(8080));
//!
//! // Async: fails twice, then succeeds on the third attempt
//! let calls = Arc::new(AtomicU32::new(0));
//! let counter = calls.clone();
//! let result = catch(move || {
//!     let n = counter.fetch_add(1, Ordering::SeqCst);
//!     async move {
//!         if n < 2 {
//!             Err("connection refused".to_string())
//!         } else {
//!             Ok("connected")
//!         }
//!     }
//! })
//! .with_timeout(Duration::from_secs(1))
//! .with_retry(3)
//! .with_backoff(BackoffConfig::exponential(Duration::from_millis(1)))
//! .await;
//!
//! assert_eq!(result, Ok("connected"));
//! assert_eq!(calls.load(Ordering::SeqCst), 3);
//! # });
//! ```
//!
//! ## Features
//!
//! - `tracing`: emit `debug!` events from the attempt loop
//! - `serde`: (de)serialize [`BackoffConfig`] and [`RetrySettings`]
//! - `proptest`: `Arbitrary` for [`BackoffConfig`]

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod attempt;
pub mod catch;
mod delay;
pub mod error;
pub mod outcome;
pub mod testing;

// Re-exports
pub use attempt::{
    execute, Attempt, AttemptFuture, BackoffConfig, CancelSignal, ExecutionConfig, FixedJitter,
    JitterSource, RetryEvent, RetrySettings, SeededJitter, ThreadRngJitter, DEFAULT_MAX_DELAY,
    JITTER_RANGE,
};
pub use catch::{catch, catch_sync, Catchable};
pub use delay::{delay, delay_ms};
pub use error::{BoxError, Error, TimeoutError};
pub use outcome::Outcome;

/// `Result` with [`Error`] as the default error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::attempt::{Attempt, BackoffConfig, ExecutionConfig, RetrySettings};
    pub use crate::catch::{catch, catch_sync};
    pub use crate::delay::{delay, delay_ms};
    pub use crate::error::{Error, TimeoutError};
    pub use crate::outcome::Outcome;
}
