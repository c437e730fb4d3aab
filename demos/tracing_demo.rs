//! Demonstrates the attempt loop's tracing events
//!
//! Run with: cargo run --example tracing_demo --features tracing

use std::time::Duration;

use caught::testing::Flaky;
use caught::{catch, Attempt, BackoffConfig, Error};

#[tokio::main]
async fn main() {
    // Set up tracing subscriber
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    tracing::info!("Starting tracing demo");

    // Two failures, then success: emits "attempt failed, retrying" twice
    let flaky = Flaky::new(2, "payload", "connection reset".to_string());
    let result = Attempt::from_fn(flaky.producer())
        .with_retry(3)
        .with_backoff(BackoffConfig::exponential(Duration::from_millis(20)).with_jitter(true))
        .await;

    match result {
        Ok(data) => tracing::info!("Fetched: {}", data),
        Err(e) => tracing::error!("Fetch failed: {}", e),
    }

    // Every attempt times out: emits "attempt timed out" and "all attempts failed"
    let result = catch(|| async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        Ok::<_, Error>(())
    })
    .with_timeout(Duration::from_millis(25))
    .with_retry(1)
    .await;

    if let Err(e) = result {
        tracing::warn!("Gave up: {}", e);
    }
}
