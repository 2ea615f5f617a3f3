//! Per-step timeout enforcement.
//!
//! # Responsibilities
//! - Bound the time one guard spends on its own work
//! - Stop the clock while the guard waits on its continuation
//! - Keep the clock running when the continuation was moved off the step's
//!   own task
//!
//! # Design Decisions
//! - Uses Tokio's timer; the deadline moves forward by exactly the time
//!   spent downstream, so each step is charged only for itself
//! - The guard future is polled before the timer: a result that is ready
//!   in the same poll as the deadline still wins
//! - On expiry the guard future is dropped and its result discarded

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::thread::{self, ThreadId};
use std::time::Duration;

use tokio::time::{sleep_until, Instant, Sleep};

/// The step ran past its limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Elapsed;

#[derive(Debug, Default)]
struct ClockState {
    paused_since: Option<Instant>,
    paused_total: Duration,
    /// Thread currently polling the step, if any.
    polling_on: Option<ThreadId>,
}

/// Tracks how long a step has spent waiting on its continuation.
#[derive(Debug, Default)]
pub(crate) struct StepClock {
    state: Mutex<ClockState>,
}

impl StepClock {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Stop charging the step until the returned guard is dropped.
    pub(crate) fn pause(self: &Arc<Self>) -> PauseGuard {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.paused_since.is_none() {
            state.paused_since = Some(Instant::now());
        }
        PauseGuard(self.clone())
    }

    /// Pause only when called from inside the step's own poll, i.e. when the
    /// continuation is awaited by the guard rather than spawned elsewhere.
    pub(crate) fn pause_if_nested(self: &Arc<Self>) -> Option<PauseGuard> {
        let nested = self.lock().polling_on == Some(thread::current().id());
        nested.then(|| self.pause())
    }

    fn enter_poll(&self) {
        self.lock().polling_on = Some(thread::current().id());
    }

    fn exit_poll(&self) {
        self.lock().polling_on = None;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ClockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resume(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(since) = state.paused_since.take() {
            state.paused_total += since.elapsed();
        }
    }

    /// Deadline for a step started at `started`, or `None` while paused.
    fn deadline(&self, started: Instant, limit: Duration) -> Option<Instant> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match state.paused_since {
            Some(_) => None,
            None => Some(started + limit + state.paused_total),
        }
    }
}

/// Resumes the step clock on drop, including when the continuation future
/// is abandoned half-way.
pub(crate) struct PauseGuard(Arc<StepClock>);

impl Drop for PauseGuard {
    fn drop(&mut self) {
        self.0.resume();
    }
}

/// A guard future raced against its step limit.
pub(crate) struct TimedStep<F> {
    future: F,
    limit: Option<Duration>,
    started: Instant,
    clock: Arc<StepClock>,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl<F> TimedStep<F>
where
    F: Future + Unpin,
{
    pub(crate) fn new(future: F, limit: Option<Duration>, clock: Arc<StepClock>) -> Self {
        Self {
            future,
            limit,
            started: Instant::now(),
            clock,
            sleep: None,
        }
    }
}

impl<F> Future for TimedStep<F>
where
    F: Future + Unpin,
{
    type Output = Result<F::Output, Elapsed>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;

        this.clock.enter_poll();
        let polled = Pin::new(&mut this.future).poll(cx);
        this.clock.exit_poll();
        if let Poll::Ready(output) = polled {
            return Poll::Ready(Ok(output));
        }

        let Some(limit) = this.limit else {
            return Poll::Pending;
        };
        // Paused: the continuation is running and owns the wakeups.
        let Some(deadline) = this.clock.deadline(this.started, limit) else {
            return Poll::Pending;
        };

        let sleep = this.sleep.get_or_insert_with(|| Box::pin(sleep_until(deadline)));
        if sleep.deadline() != deadline {
            sleep.as_mut().reset(deadline);
        }
        match sleep.as_mut().poll(cx) {
            Poll::Ready(()) => Poll::Ready(Err(Elapsed)),
            Poll::Pending => Poll::Pending,
        }
    }
}
