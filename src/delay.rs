//! Timer-backed pauses.
//!
//! Both functions sleep on the tokio timer, so tests that pause the clock
//! (`#[tokio::test(start_paused = true)]`) see them complete instantly while
//! still advancing time by the requested amount.

use std::time::Duration;

/// Resolve after `duration`. A zero duration still yields to the scheduler.
///
/// # Example
///
/// ```rust
/// use caught::delay;
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// delay(Duration::from_millis(5)).await;
/// # });
/// ```
pub async fn delay(duration: Duration) {
    tokio::time::sleep(duration).await;
}

/// Resolve after `millis` milliseconds.
pub async fn delay_ms(millis: u64) {
    delay(Duration::from_millis(millis)).await;
}
