//! Retry Patterns Example
//!
//! Demonstrates running fallible operations with `caught`.
//! Shows practical patterns including:
//! - Sync operations returning a result immediately
//! - Basic retry with different backoff strategies
//! - Retry with observability hooks
//! - Timeout handling and custom timeout errors
//! - Cooperative cancellation of timed-out work
//! - Sharing one configuration between many executions

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use caught::prelude::*;
use caught::{execute, CancelSignal, RetryEvent, SeededJitter};

// ==================== Sync Operations ====================

/// Example 1: Sync operations
///
/// A function returning a `Result` is invoked right away.
fn example_sync() {
    println!("\n=== Example 1: Sync Operations ===");

    match catch(|| "8080".parse::<u16>()) {
        Ok(port) => println!("Parsed port: {}", port),
        Err(e) => println!("Invalid port: {}", e),
    }

    match catch(|| "eighty".parse::<u16>()) {
        Ok(port) => println!("Parsed port: {}", port),
        Err(e) => println!("Invalid port: {}", e),
    }
}

// ==================== Basic Retry ====================

/// Example 2: Basic retry with exponential backoff
///
/// Demonstrates retrying an operation that fails transiently.
async fn example_basic_retry() {
    println!("\n=== Example 2: Basic Retry ===");

    let attempts = Arc::new(AtomicU32::new(0));

    let result = catch({
        let attempts = attempts.clone();
        move || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                println!("  Attempt {}", n + 1);
                if n < 2 {
                    Err("transient failure".to_string())
                } else {
                    Ok("success!")
                }
            }
        }
    })
    .with_retry(5)
    .with_backoff(BackoffConfig::exponential(Duration::from_millis(100)))
    .await;

    match result {
        Ok(value) => println!(
            "Success after {} attempts: {}",
            attempts.load(Ordering::SeqCst),
            value
        ),
        Err(e) => println!("Failed: {}", e),
    }
}

// ==================== Different Backoff Strategies ====================

/// Example 3: Comparing backoff strategies
async fn example_backoff_strategies() {
    println!("\n=== Example 3: Backoff Strategies ===");

    let base = Duration::from_millis(100);
    let strategies = [
        ("Linear", BackoffConfig::linear(base)),
        ("Exponential", BackoffConfig::exponential(base)),
        (
            "Exponential, capped at 300ms",
            BackoffConfig::exponential(base).with_max_delay(Duration::from_millis(300)),
        ),
    ];

    for (name, backoff) in strategies {
        let delays: Vec<_> = (1..=5)
            .filter_map(|attempt| backoff.delay_for_attempt(attempt))
            .collect();
        println!("{} delays: {:?}", name, delays);
    }

    let jittered = BackoffConfig::exponential(base).with_jitter(true);
    let source = SeededJitter::new(7);
    println!(
        "Exponential with seeded jitter, attempt 1: {:?}",
        jittered.delay_with_jitter(1, &source)
    );
}

// ==================== Retry with Observability ====================

/// Example 4: Observing each retry
async fn example_retry_with_hooks() {
    println!("\n=== Example 4: Retry with Hooks ===");

    let flaky = caught::testing::Flaky::new(3, 200u16, "503 Service Unavailable".to_string());

    let result = Attempt::from_fn(flaky.producer())
        .with_retry(4)
        .with_backoff(BackoffConfig::linear(Duration::from_millis(50)))
        .with_on_retry(|event: &RetryEvent<'_, String>| {
            println!(
                "  Attempt {} failed ({}), retrying in {:?} (elapsed {:?})",
                event.attempt, event.error, event.next_delay, event.elapsed
            );
        })
        .await;

    println!("Result: {:?} after {} calls", result, flaky.calls());
}

// ==================== Timeout ====================

#[derive(Debug, Clone, PartialEq)]
enum FetchError {
    TimedOut,
    Refused,
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::TimedOut => write!(f, "upstream did not answer in time"),
            FetchError::Refused => write!(f, "connection refused"),
        }
    }
}

/// Example 5: Default and custom timeout errors
async fn example_timeout() {
    println!("\n=== Example 5: Timeout ===");

    let slow = || async {
        delay(Duration::from_secs(2)).await;
        Ok::<_, Error>("too late")
    };

    match catch(slow).with_timeout(Duration::from_millis(100)).await {
        Ok(value) => println!("Got: {}", value),
        Err(e) if e.is_timeout() => println!("Timed out: {}", e),
        Err(e) => println!("Failed: {}", e),
    }

    let result = catch(async {
        delay(Duration::from_secs(2)).await;
        Err::<(), _>(FetchError::Refused)
    })
    .with_timeout_error(Duration::from_millis(100), FetchError::TimedOut)
    .await;

    if let Err(e) = result {
        println!("Custom timeout error: {}", e);
    }
}

// ==================== Cooperative Cancellation ====================

/// Example 6: Stopping background work when an attempt times out
async fn example_cancellation() {
    println!("\n=== Example 6: Cooperative Cancellation ===");

    let result = Attempt::from_fn_cancellable(|signal: CancelSignal| async move {
        let worker = tokio::spawn({
            let signal = signal.clone();
            async move {
                signal.cancelled().await;
                println!("  Background worker saw cancellation and stopped");
            }
        });
        delay(Duration::from_secs(1)).await;
        worker.abort();
        Ok::<_, String>(())
    })
    .with_timeout(Duration::from_millis(50))
    .await;

    // Give the worker a chance to observe the signal
    delay(Duration::from_millis(10)).await;
    println!("Result: {:?}", result);
}

// ==================== Shared Configuration ====================

/// Example 7: One config, many executions
async fn example_shared_config() {
    println!("\n=== Example 7: Shared Configuration ===");

    let config = ExecutionConfig::new()
        .with_timeout(Duration::from_millis(200))
        .with_retry(2)
        .with_backoff(BackoffConfig::linear(Duration::from_millis(10)));

    let (a, b) = tokio::join!(
        execute(&config, || async { Ok::<_, String>("service a") }),
        execute(&config, || async { Err::<&str, _>("service b down".to_string()) }),
    );

    println!("a: {:?}", a);
    println!("b: {:?}", b);
}

#[tokio::main]
async fn main() {
    println!("======================================");
    println!("       Retry Patterns Example         ");
    println!("======================================");

    example_sync();
    example_basic_retry().await;
    example_backoff_strategies().await;
    example_retry_with_hooks().await;
    example_timeout().await;
    example_cancellation().await;
    example_shared_config().await;

    println!("\n======================================");
    println!("           Examples Complete           ");
    println!("======================================");
}
