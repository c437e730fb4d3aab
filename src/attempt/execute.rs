//! The attempt loop: timeout race, retry, backoff.

use std::borrow::Borrow;
use std::fmt;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::future::FusedFuture;
use tokio::time::{Instant, Sleep, Timeout};

use super::config::{ExecutionConfig, RetryEvent, TimeoutErrorFn};
use super::signal::CancelSignal;
use super::source::{Produce, Producer, Source};

/// Run `producer` under `config` until an attempt succeeds or attempts run out.
///
/// This is the function form of [`Attempt`](super::Attempt): the config is a
/// plain value and can be shared between any number of executions. Unlike
/// `Attempt::from_fn`, the producer is first invoked when the returned future
/// is polled.
///
/// # Example
///
/// ```rust
/// use caught::{execute, BackoffConfig, ExecutionConfig};
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let config = ExecutionConfig::new()
///     .with_retry(2)
///     .with_backoff(BackoffConfig::linear(Duration::from_millis(1)));
///
/// let calls = AtomicU32::new(0);
/// let result = execute(&config, || {
///     let n = calls.fetch_add(1, Ordering::SeqCst);
///     async move {
///         if n < 2 { Err(format!("attempt {} failed", n + 1)) } else { Ok(n) }
///     }
/// })
/// .await;
///
/// assert_eq!(result, Ok(2));
/// assert_eq!(calls.load(Ordering::SeqCst), 3);
/// # });
/// ```
pub async fn execute<T, E, F, Fut>(config: &ExecutionConfig<E>, producer: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut producer = Producer(producer);
    let first = producer.fresh_attempt();
    AttemptFuture::<_, E, _>::new(first, producer, config).await
}

/// The future returned by awaiting an [`Attempt`](super::Attempt).
///
/// Runs attempts one after another: each races its timeout, failures are
/// followed by the backoff delay, and the first success or the last failure
/// is the output. Nothing here needs `Send` or `'static`; the future is `Send`
/// whenever the operation's futures and values are.
pub struct AttemptFuture<S: Source, E, C> {
    rest: S,
    config: C,
    attempt: u32,
    started: Option<Instant>,
    state: State<S::Future, E>,
    #[cfg(feature = "tracing")]
    span: tracing::Span,
}

enum State<Fut, E> {
    Queued(Fut, CancelSignal),
    Racing(Race<Fut, E>, CancelSignal),
    Waiting(Option<Pin<Box<Sleep>>>, E),
    Done,
}

enum Race<Fut, E> {
    Untimed(Pin<Box<Fut>>),
    Timed(Pin<Box<Timeout<Fut>>>, Duration, TimeoutErrorFn<E>),
}

// Attempt futures are boxed before they are polled; nothing else is pinned.
impl<S: Source, E, C> Unpin for AttemptFuture<S, E, C> {}

impl<S, E, C> AttemptFuture<S, E, C>
where
    S: Source,
    C: Borrow<ExecutionConfig<E>>,
{
    pub(crate) fn new(first: (S::Future, CancelSignal), rest: S, config: C) -> Self {
        #[cfg(feature = "tracing")]
        let span = {
            let settings: &ExecutionConfig<E> = config.borrow();
            tracing::debug_span!("attempt", max_attempts = settings.max_attempts())
        };

        let (future, signal) = first;
        Self {
            rest,
            config,
            attempt: 1,
            started: None,
            state: State::Queued(future, signal),
            #[cfg(feature = "tracing")]
            span,
        }
    }
}

impl<S, E, C, T> Future for AttemptFuture<S, E, C>
where
    S: Source,
    S::Future: Future<Output = Result<T, E>>,
    C: Borrow<ExecutionConfig<E>>,
{
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        #[cfg(feature = "tracing")]
        let _enter = this.span.enter();
        let config: &ExecutionConfig<E> = this.config.borrow();

        loop {
            match mem::replace(&mut this.state, State::Done) {
                State::Queued(future, signal) => {
                    this.started.get_or_insert_with(Instant::now);
                    let race = match config.timeout_error() {
                        Some((duration, make_error)) => Race::Timed(
                            Box::pin(tokio::time::timeout(duration, future)),
                            duration,
                            make_error.clone(),
                        ),
                        None => Race::Untimed(Box::pin(future)),
                    };
                    this.state = State::Racing(race, signal);
                }
                State::Racing(mut race, signal) => {
                    let polled = match &mut race {
                        Race::Untimed(future) => future.as_mut().poll(cx),
                        Race::Timed(timeout, duration, make_error) => {
                            timeout.as_mut().poll(cx).map(|outcome| {
                                outcome.unwrap_or_else(|_elapsed| {
                                    signal.cancel();
                                    #[cfg(feature = "tracing")]
                                    tracing::debug!(
                                        timeout_ms = millis(*duration),
                                        "attempt timed out"
                                    );
                                    Err(make_error(*duration))
                                })
                            })
                        }
                    };
                    let Poll::Ready(result) = polled else {
                        this.state = State::Racing(race, signal);
                        return Poll::Pending;
                    };
                    drop(race);

                    let error = match result {
                        Ok(value) => {
                            #[cfg(feature = "tracing")]
                            tracing::debug!(attempt = this.attempt, "attempt succeeded");
                            return Poll::Ready(Ok(value));
                        }
                        Err(error) => error,
                    };

                    let attempt = this.attempt;
                    let elapsed = this.started.map_or(Duration::ZERO, |started| started.elapsed());

                    if attempt >= config.max_attempts() {
                        #[cfg(feature = "tracing")]
                        tracing::debug!(
                            attempts = attempt,
                            elapsed_ms = millis(elapsed),
                            "all attempts failed"
                        );
                        return Poll::Ready(Err(error));
                    }

                    let delay = config
                        .backoff()
                        .delay_with_jitter(attempt, config.jitter_source());

                    config.notify_retry(&RetryEvent {
                        attempt,
                        error: &error,
                        next_delay: delay,
                        elapsed,
                    });

                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        attempt,
                        delay_ms = delay.map(millis),
                        "attempt failed, retrying"
                    );

                    let sleep = delay.map(|delay| Box::pin(tokio::time::sleep(delay)));
                    this.state = State::Waiting(sleep, error);
                }
                State::Waiting(mut sleep, error) => {
                    if let Some(timer) = sleep.as_mut() {
                        if timer.as_mut().poll(cx).is_pending() {
                            this.state = State::Waiting(sleep, error);
                            return Poll::Pending;
                        }
                    }

                    match this.rest.next_attempt() {
                        Some((future, signal)) => {
                            this.attempt += 1;
                            this.state = State::Queued(future, signal);
                        }
                        None => return Poll::Ready(Err(error)),
                    }
                }
                State::Done => panic!("AttemptFuture polled after completion"),
            }
        }
    }
}

impl<S, E, C, T> FusedFuture for AttemptFuture<S, E, C>
where
    S: Source,
    S::Future: Future<Output = Result<T, E>>,
    C: Borrow<ExecutionConfig<E>>,
{
    fn is_terminated(&self) -> bool {
        matches!(self.state, State::Done)
    }
}

impl<S: Source, E, C> fmt::Debug for AttemptFuture<S, E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            State::Queued(..) => "queued",
            State::Racing(..) => "racing",
            State::Waiting(..) => "waiting",
            State::Done => "done",
        };
        f.debug_struct("AttemptFuture")
            .field("attempt", &self.attempt)
            .field("state", &state)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "tracing")]
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
