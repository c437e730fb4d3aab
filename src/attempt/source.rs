//! Where an attempt's futures come from.
//!
//! - [`Pending`]: a future that already exists. It can be awaited once, so it
//!   supports a single attempt only.
//! - [`Retryable`]: a producer invoked for every attempt, yielding a fresh
//!   future each time.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

use super::signal::CancelSignal;

/// Creates the future for one attempt.
pub trait Produce {
    /// The future produced for each attempt.
    type Future;

    /// Produce a fresh future. `signal` is triggered if that attempt times out.
    fn produce(&mut self, signal: CancelSignal) -> Self::Future;

    /// Produce a fresh future along with its own signal.
    fn fresh_attempt(&mut self) -> (Self::Future, CancelSignal) {
        let signal = CancelSignal::new();
        (self.produce(signal.clone()), signal)
    }
}

/// Supplies the futures for attempts after the first.
pub trait Source {
    /// The future run by each attempt.
    type Future: Future;

    /// The next attempt, or `None` when no further attempt can be made.
    fn next_attempt(&mut self) -> Option<(Self::Future, CancelSignal)>;
}

impl<P> Source for P
where
    P: Produce,
    P::Future: Future,
{
    type Future = P::Future;

    fn next_attempt(&mut self) -> Option<(P::Future, CancelSignal)> {
        Some(self.fresh_attempt())
    }
}

/// Adapts a zero-argument producer, ignoring the cancel signal.
pub struct Producer<F>(pub(crate) F);

impl<F, Fut> Produce for Producer<F>
where
    F: FnMut() -> Fut,
{
    type Future = Fut;

    fn produce(&mut self, _signal: CancelSignal) -> Fut {
        (self.0)()
    }
}

/// Adapts a producer that receives each attempt's [`CancelSignal`].
pub struct CancellableProducer<F>(pub(crate) F);

impl<F, Fut> Produce for CancellableProducer<F>
where
    F: FnMut(CancelSignal) -> Fut,
{
    type Future = Fut;

    fn produce(&mut self, signal: CancelSignal) -> Fut {
        (self.0)(signal)
    }
}

/// A source with nothing after the first attempt.
pub struct Exhausted<Fut>(PhantomData<fn() -> Fut>);

impl<Fut> Exhausted<Fut> {
    pub(crate) fn new() -> Self {
        Exhausted(PhantomData)
    }
}

impl<Fut: Future> Source for Exhausted<Fut> {
    type Future = Fut;

    fn next_attempt(&mut self) -> Option<(Fut, CancelSignal)> {
        None
    }
}

/// An already-created future; supports one attempt.
pub struct Pending<Fut> {
    pub(crate) future: Fut,
}

/// A producer plus the future from its eager first invocation.
pub struct Retryable<P, Fut> {
    pub(crate) producer: P,
    pub(crate) first: (Fut, CancelSignal),
}

impl<P, Fut> Retryable<P, Fut>
where
    P: Produce<Future = Fut>,
{
    /// Invoke the producer once, eagerly, and keep the result for attempt one.
    pub(crate) fn start(mut producer: P) -> Self {
        let first = producer.fresh_attempt();
        Self { producer, first }
    }
}

impl<F> fmt::Debug for Producer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Producer(<function>)")
    }
}

impl<F> fmt::Debug for CancellableProducer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CancellableProducer(<function>)")
    }
}

impl<Fut> fmt::Debug for Pending<Fut> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pending")
            .field("future", &"<future>")
            .finish()
    }
}

impl<P: fmt::Debug, Fut> fmt::Debug for Retryable<P, Fut> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retryable")
            .field("producer", &self.producer)
            .finish_non_exhaustive()
    }
}

impl<Fut> fmt::Debug for Exhausted<Fut> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Exhausted")
    }
}
