//! Integration tests for the attempt loop.

use super::*;
use crate::catch;
use crate::testing::Flaky;
use futures::future::FusedFuture;
use std::cell::Cell;
use std::future::IntoFuture;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

fn counting_failures(calls: &Arc<AtomicU32>) -> impl FnMut() -> std::future::Ready<Result<(), String>> {
    let calls = calls.clone();
    move || {
        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
        std::future::ready(Err(format!("failure {}", n)))
    }
}

#[tokio::test]
async fn test_retry_succeeds_on_third_attempt() {
    let flaky = Flaky::new(2, "success", "transient failure");

    let result = Attempt::from_fn(flaky.producer())
        .with_retry(5)
        .with_backoff(BackoffConfig::linear(Duration::from_millis(1)))
        .await;

    assert_eq!(result, Ok("success"));
    assert_eq!(flaky.calls(), 3);
}

#[tokio::test]
async fn test_retry_exhausted_returns_last_error() {
    let calls = Arc::new(AtomicU32::new(0));

    let result = Attempt::from_fn(counting_failures(&calls))
        .with_retry(3)
        .await;

    assert_eq!(result, Err("failure 4".to_string()));
    assert_eq!(calls.load(Ordering::SeqCst), 4); // 1 initial + 3 retries
}

#[tokio::test]
async fn test_single_attempt_by_default() {
    let flaky = Flaky::<(), _>::always_failing("down");

    let result = Attempt::from_fn(flaky.producer()).await;

    assert_eq!(result, Err("down"));
    assert_eq!(flaky.calls(), 1);
}

#[tokio::test]
async fn test_success_stops_retrying() {
    let flaky = Flaky::new(0, 7, "unused");

    let result = Attempt::from_fn(flaky.producer()).with_retry(5).await;

    assert_eq!(result, Ok(7));
    assert_eq!(flaky.calls(), 1);
}

#[tokio::test]
async fn test_producer_is_invoked_eagerly() {
    let flaky = Flaky::new(0, 1, "unused");

    let attempt = Attempt::from_fn(flaky.producer()).with_retry(2);
    assert_eq!(flaky.calls(), 1);

    assert_eq!(attempt.await, Ok(1));
    assert_eq!(flaky.calls(), 1);
}

#[tokio::test]
async fn test_last_retry_value_wins() {
    let flaky = Flaky::<(), _>::always_failing("down");

    let _ = Attempt::from_fn(flaky.producer())
        .with_retry(10)
        .with_retry(1)
        .await;

    assert_eq!(flaky.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_on_retry_hook_sees_each_retry() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let flaky = Flaky::new(2, "success", "transient");

    let result = Attempt::from_fn(flaky.producer())
        .with_retry(5)
        .with_backoff(BackoffConfig::linear(Duration::from_millis(10)))
        .with_on_retry({
            let events = events.clone();
            move |event: &RetryEvent<'_, &'static str>| {
                events
                    .lock()
                    .unwrap()
                    .push((event.attempt, event.error.to_string(), event.next_delay));
            }
        })
        .await;

    assert_eq!(result, Ok("success"));
    assert_eq!(
        *events.lock().unwrap(),
        vec![
            (1, "transient".to_string(), Some(Duration::from_millis(10))),
            (2, "transient".to_string(), Some(Duration::from_millis(20))),
        ]
    );
}

#[tokio::test]
async fn test_hook_not_called_after_final_attempt() {
    let hook_calls = Arc::new(AtomicU32::new(0));
    let flaky = Flaky::<(), _>::always_failing("down");

    let _ = Attempt::from_fn(flaky.producer())
        .with_retry(2)
        .with_on_retry({
            let hook_calls = hook_calls.clone();
            move |_event: &RetryEvent<'_, &'static str>| {
                hook_calls.fetch_add(1, Ordering::SeqCst);
            }
        })
        .await;

    assert_eq!(flaky.calls(), 3);
    assert_eq!(hook_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_uses_default_message() {
    let result = catch(async {
        tokio::time::sleep(Duration::from_millis(1000)).await;
        Ok::<_, String>(42)
    })
    .with_timeout(Duration::from_millis(50))
    .await;

    assert_eq!(result, Err("Operation timed out after 50ms".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_uses_custom_error() {
    #[derive(Debug, Clone, PartialEq)]
    enum FetchError {
        TooSlow,
        #[allow(dead_code)]
        Refused,
    }

    let result = catch(async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        Ok::<_, FetchError>(42)
    })
    .with_timeout_error(Duration::from_millis(50), FetchError::TooSlow)
    .await;

    assert_eq!(result, Err(FetchError::TooSlow));
}

#[tokio::test]
async fn test_timeout_passes_through_success() {
    let result = catch(async { Ok::<_, String>(42) })
        .with_timeout(Duration::from_secs(1))
        .await;

    assert_eq!(result, Ok(42));
}

#[tokio::test]
async fn test_timeout_passes_through_inner_error() {
    let result = catch(async { Err::<i32, _>("inner error".to_string()) })
        .with_timeout(Duration::from_secs(1))
        .await;

    assert_eq!(result, Err("inner error".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_timed_out_future_is_dropped() {
    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    let dropped = Arc::new(AtomicBool::new(false));
    let flag = DropFlag(dropped.clone());

    let result = catch(async move {
        let _flag = flag;
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok::<_, String>(())
    })
    .with_timeout(Duration::from_millis(10))
    .await;

    assert!(result.is_err());
    assert!(dropped.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn test_retry_with_timeout_per_attempt() {
    let attempts = Arc::new(AtomicU32::new(0));

    let result = Attempt::from_fn({
        let attempts = attempts.clone();
        move || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    // First two attempts take too long
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
                Ok::<_, String>("success")
            }
        }
    })
    .with_timeout(Duration::from_millis(10))
    .with_retry(5)
    .await;

    assert_eq!(result, Ok("success"));
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_on_every_attempt_surfaces_timeout() {
    let attempts = Arc::new(AtomicU32::new(0));

    let result = Attempt::from_fn({
        let attempts = attempts.clone();
        move || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<(), String>(())
            }
        }
    })
    .with_timeout(Duration::from_millis(20))
    .with_retry(2)
    .await;

    assert_eq!(result, Err("Operation timed out after 20ms".to_string()));
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_signals_cancellation() {
    let signals = Arc::new(Mutex::new(Vec::new()));

    let result = Attempt::from_fn_cancellable({
        let signals = signals.clone();
        move |signal: CancelSignal| {
            let attempt = {
                let mut signals = signals.lock().unwrap();
                signals.push(signal);
                signals.len()
            };
            async move {
                if attempt == 1 {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
                Ok::<_, String>(attempt)
            }
        }
    })
    .with_timeout(Duration::from_millis(10))
    .with_retry(1)
    .await;

    assert_eq!(result, Ok(2));
    let signals = signals.lock().unwrap();
    assert_eq!(signals.len(), 2);
    assert!(signals[0].is_cancelled());
    assert!(!signals[1].is_cancelled());
}

#[tokio::test(start_paused = true)]
async fn test_exponential_backoff_timing() {
    let flaky = Flaky::new(3, "done", "retry");
    let start = Instant::now();

    let result = Attempt::from_fn(flaky.producer())
        .with_retry(5)
        .with_backoff(BackoffConfig::exponential(Duration::from_millis(10)))
        .await;

    let elapsed = start.elapsed();
    assert_eq!(result, Ok("done"));
    // 10ms + 20ms + 40ms
    assert!(
        elapsed >= Duration::from_millis(70) && elapsed < Duration::from_millis(75),
        "Expected about 70ms, got {:?}",
        elapsed
    );
}

#[tokio::test(start_paused = true)]
async fn test_linear_backoff_timing() {
    let flaky = Flaky::new(3, "done", "retry");
    let start = Instant::now();

    let _ = Attempt::from_fn(flaky.producer())
        .with_retry(5)
        .with_backoff(BackoffConfig::linear(Duration::from_millis(10)))
        .await;

    let elapsed = start.elapsed();
    // 10ms + 20ms + 30ms
    assert!(
        elapsed >= Duration::from_millis(60) && elapsed < Duration::from_millis(65),
        "Expected about 60ms, got {:?}",
        elapsed
    );
}

#[tokio::test(start_paused = true)]
async fn test_backoff_respects_cap() {
    let flaky = Flaky::<(), _>::always_failing("down");
    let start = Instant::now();

    let _ = Attempt::from_fn(flaky.producer())
        .with_retry(3)
        .with_backoff(
            BackoffConfig::exponential(Duration::from_millis(100))
                .with_max_delay(Duration::from_millis(150)),
        )
        .await;

    let elapsed = start.elapsed();
    // 100ms + 150ms + 150ms, no delay after the final attempt
    assert!(
        elapsed >= Duration::from_millis(400) && elapsed < Duration::from_millis(405),
        "Expected about 400ms, got {:?}",
        elapsed
    );
    assert_eq!(flaky.calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_jitter_added_from_source() {
    let flaky = Flaky::<(), _>::always_failing("down");
    let start = Instant::now();

    let _ = Attempt::from_fn(flaky.producer())
        .with_retry(2)
        .with_backoff(BackoffConfig::linear(Duration::from_millis(10)).with_jitter(true))
        .with_jitter_source(FixedJitter::new(Duration::from_millis(5)))
        .await;

    let elapsed = start.elapsed();
    // (10ms + 5ms) + (20ms + 5ms)
    assert!(
        elapsed >= Duration::from_millis(40) && elapsed < Duration::from_millis(45),
        "Expected about 40ms, got {:?}",
        elapsed
    );
}

#[tokio::test(start_paused = true)]
async fn test_seeded_jitter_is_deterministic() {
    async fn observed_delays(seed: u64) -> Vec<Option<Duration>> {
        let delays = Arc::new(Mutex::new(Vec::new()));
        let flaky = Flaky::<(), _>::always_failing("down");

        let _ = Attempt::from_fn(flaky.producer())
            .with_retry(3)
            .with_backoff(BackoffConfig::exponential(Duration::from_millis(10)).with_jitter(true))
            .with_jitter_source(SeededJitter::new(seed))
            .with_on_retry({
                let delays = delays.clone();
                move |event: &RetryEvent<'_, &'static str>| {
                    delays.lock().unwrap().push(event.next_delay);
                }
            })
            .await;

        let delays = delays.lock().unwrap().clone();
        delays
    }

    let first = observed_delays(99).await;
    let second = observed_delays(99).await;

    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
    for (i, delay) in first.iter().enumerate() {
        let base = Duration::from_millis(10 * (1 << i));
        let delay = delay.expect("base delay configured");
        assert!(delay >= base && delay < base + JITTER_RANGE);
    }
}

#[tokio::test(start_paused = true)]
async fn test_no_base_delay_retries_back_to_back() {
    let flaky = Flaky::<(), _>::always_failing("down");
    let start = Instant::now();

    let _ = Attempt::from_fn(flaky.producer())
        .with_retry(4)
        .with_backoff(BackoffConfig::new().with_exponential(true).with_jitter(true))
        .await;

    assert_eq!(flaky.calls(), 5);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_backoff_without_retries_has_no_effect() {
    let flaky = Flaky::<(), _>::always_failing("down");
    let start = Instant::now();

    let result = Attempt::from_fn(flaky.producer())
        .with_backoff(BackoffConfig::linear(Duration::from_secs(1)))
        .await;

    assert_eq!(result, Err("down"));
    assert_eq!(flaky.calls(), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test]
async fn test_pending_future_runs_once() {
    let result = Attempt::from_future(async { Ok::<_, String>("ready") }).run().await;

    assert_eq!(result, Ok("ready"));
}

#[tokio::test]
async fn test_execute_shares_config_between_runs() {
    let config = ExecutionConfig::new().with_retry(2);
    let first = Flaky::<(), _>::always_failing("first");
    let second = Flaky::new(1, "ok", "second");

    let (a, b) = tokio::join!(
        execute(&config, first.producer()),
        execute(&config, second.producer()),
    );

    assert_eq!(a, Err("first"));
    assert_eq!(b, Ok("ok"));
    assert_eq!(first.calls(), 3);
    assert_eq!(second.calls(), 2);
}

#[tokio::test]
async fn test_execute_is_lazy() {
    let flaky = Flaky::new(0, 1, "unused");
    let config = ExecutionConfig::new();

    let pending = execute(&config, flaky.producer());
    assert_eq!(flaky.calls(), 0);

    assert_eq!(pending.await, Ok(1));
    assert_eq!(flaky.calls(), 1);
}

#[tokio::test]
async fn test_with_config_replaces_configuration() {
    let flaky = Flaky::<(), _>::always_failing("down");

    let _ = Attempt::from_fn(flaky.producer())
        .with_retry(10)
        .with_config(ExecutionConfig::new().with_retry(1))
        .await;

    assert_eq!(flaky.calls(), 2);
}

#[test]
fn test_attempt_is_debug() {
    let attempt = Attempt::from_fn(|| async { Ok::<_, String>(1) }).with_retry(2);
    let debug = format!("{:?}", attempt);

    assert!(debug.contains("Attempt"));
    assert!(debug.contains("max_retries: 2"));
}

#[tokio::test]
async fn test_await_over_borrowed_state() {
    let base = String::from("value");

    let result = catch(|| async { Ok::<_, String>(base.len()) })
        .with_timeout(Duration::from_secs(1))
        .with_retry(1)
        .await;

    assert_eq!(result, Ok(5));
}

#[tokio::test]
async fn test_await_pending_future_over_borrowed_state() {
    let names = vec!["a".to_string(), "b".to_string()];

    let result = catch(async { Ok::<_, String>(names.join(",")) })
        .with_timeout(Duration::from_secs(1))
        .await;

    assert_eq!(result, Ok("a,b".to_string()));
    assert_eq!(names.len(), 2);
}

#[tokio::test]
async fn test_await_future_holding_rc() {
    let calls = Rc::new(Cell::new(0u32));

    let result = Attempt::from_fn(|| {
        let calls = Rc::clone(&calls);
        async move {
            tokio::task::yield_now().await;
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(format!("attempt {} not ready", calls.get()))
            } else {
                Ok(calls.get())
            }
        }
    })
    .with_timeout(Duration::from_secs(1))
    .with_retry(5)
    .await;

    assert_eq!(result, Ok(3));
    assert_eq!(calls.get(), 3);
}

#[tokio::test]
async fn test_run_matches_await() {
    let limit = 2u32;
    let calls = Cell::new(0u32);

    let result = Attempt::from_fn(|| {
        calls.set(calls.get() + 1);
        let n = calls.get();
        async move { if n > limit { Ok(n) } else { Err(n) } }
    })
    .with_retry(4)
    .run()
    .await;

    assert_eq!(result, Ok(3));
    assert_eq!(calls.get(), 3);
}

#[tokio::test]
async fn test_attempt_can_be_spawned() {
    let flaky = Flaky::new(1, "spawned", "transient");

    let handle = tokio::spawn(
        Attempt::from_fn(flaky.producer())
            .with_retry(2)
            .into_future(),
    );

    assert_eq!(handle.await.unwrap(), Ok("spawned"));
    assert_eq!(flaky.calls(), 2);
}

#[tokio::test]
async fn test_attempt_future_is_fused() {
    let mut future = Attempt::from_fn(|| async { Err::<(), _>("down") })
        .with_retry(1)
        .into_future();
    assert!(!future.is_terminated());

    let result = (&mut future).await;

    assert_eq!(result, Err("down"));
    assert!(future.is_terminated());
}
