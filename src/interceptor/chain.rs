//! Per-request interceptor chain.
//!
//! # Responsibilities
//! - Select and order the interceptors that apply to one path
//! - Run them as a short-circuiting pipeline with an explicit cursor
//! - Hand each guard a continuation over the rest of the chain
//! - Fail closed on timeout, guard error or guard panic
//!
//! # Design Decisions
//! - The chain owns a snapshot of its entries; registry changes made while
//!   it runs are invisible to it
//! - A continuation is consumed by `proceed`, so it runs at most once
//! - A continuation is scoped to its step: once the step has a result (or
//!   the chain has a verdict) it runs nothing further
//! - A guard that starts its continuation and returns before it finishes
//!   fails closed
//! - The verdict is attributed to the innermost interceptor that blocked,
//!   unless an outer guard overrode it

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::error::RouterError;
use crate::interceptor::entry::{InterceptContext, InterceptorEntry};
use crate::interceptor::timeout::{StepClock, TimedStep};
use crate::navigation::NavigationRequest;
use crate::observability::metrics;

/// Verdict of a completed chain.
#[derive(Debug)]
pub struct ChainVerdict {
    pub allowed: bool,
    /// Why the chain blocked. Always set when `allowed` is false.
    pub failure: Option<RouterError>,
    /// Interceptors whose guard was actually invoked, in invocation order.
    pub invoked: Vec<String>,
}

#[derive(Debug, Default)]
struct ChainTrace {
    blocker: Option<String>,
    failure: Option<RouterError>,
    invoked: Vec<String>,
}

#[derive(Debug)]
struct ChainInner {
    request: Arc<NavigationRequest>,
    steps: Vec<Arc<InterceptorEntry>>,
    trace: Mutex<ChainTrace>,
}

/// The ordered interceptors applying to one navigation request.
#[derive(Debug, Clone)]
pub struct InterceptorChain {
    inner: Arc<ChainInner>,
}

enum Step {
    /// Guard allowed without taking its continuation.
    Continue,
    Done(bool),
}

/// Lifetime of one step, shared with the continuation it handed out.
///
/// Scopes nest: the root scope belongs to `proceed`, each step's scope has
/// the scope it runs in as parent. A closed scope closes everything below it.
#[derive(Debug, Default)]
struct StepScope {
    parent: Option<Arc<StepScope>>,
    started: AtomicBool,
    finished: AtomicBool,
    closed: AtomicBool,
}

impl StepScope {
    fn root() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn child(parent: &Arc<Self>) -> Arc<Self> {
        Arc::new(Self {
            parent: Some(parent.clone()),
            ..Self::default()
        })
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst) || self.parent.as_ref().is_some_and(|p| p.is_closed())
    }
}

/// Closes a scope on every exit, including when the future owning it is
/// dropped mid-step.
struct CloseOnExit(Arc<StepScope>);

impl Drop for CloseOnExit {
    fn drop(&mut self) {
        self.0.closed.store(true, Ordering::SeqCst);
    }
}

impl InterceptorChain {
    /// Build the chain for `request` from a registry snapshot: keep entries
    /// that apply to the path and sort them by descending priority. The sort
    /// is stable, so registration order breaks ties.
    pub fn build(request: Arc<NavigationRequest>, snapshot: &[Arc<InterceptorEntry>]) -> Self {
        let mut steps: Vec<_> = snapshot
            .iter()
            .filter(|entry| entry.applies_to(&request.path))
            .cloned()
            .collect();
        steps.sort_by(|a, b| b.priority.cmp(&a.priority));

        Self {
            inner: Arc::new(ChainInner {
                request,
                steps,
                trace: Mutex::new(ChainTrace::default()),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.steps.is_empty()
    }

    /// Names of the chain's interceptors in execution order.
    pub fn names(&self) -> Vec<String> {
        self.inner.steps.iter().map(|s| s.name.clone()).collect()
    }

    /// Run the chain from the first interceptor.
    pub async fn proceed(&self) -> ChainVerdict {
        let root = StepScope::root();
        let settled = CloseOnExit(root.clone());
        let allowed = self.run_from(0, root).await;
        drop(settled);

        let mut trace = self.trace();
        let invoked = std::mem::take(&mut trace.invoked);
        if allowed {
            return ChainVerdict {
                allowed,
                failure: None,
                invoked,
            };
        }

        let failure = trace.failure.take().unwrap_or_else(|| RouterError::InterceptorBlocked {
            name: trace.blocker.take().unwrap_or_default(),
        });
        ChainVerdict {
            allowed,
            failure: Some(failure),
            invoked,
        }
    }

    fn trace(&self) -> std::sync::MutexGuard<'_, ChainTrace> {
        self.inner.trace.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn run_from(&self, cursor: usize, scope: Arc<StepScope>) -> BoxFuture<'static, bool> {
        let chain = self.clone();
        async move {
            let mut cursor = cursor;
            loop {
                if scope.is_closed() {
                    tracing::debug!(
                        path = %chain.inner.request.path,
                        cursor,
                        "Continuation outlived its step, skipping remaining interceptors"
                    );
                    return false;
                }
                let Some(entry) = chain.inner.steps.get(cursor).cloned() else {
                    return true;
                };
                match chain.run_step(cursor, entry, &scope).await {
                    Step::Continue => cursor += 1,
                    Step::Done(allowed) => return allowed,
                }
            }
        }
        .boxed()
    }

    async fn run_step(&self, cursor: usize, entry: Arc<InterceptorEntry>, parent: &Arc<StepScope>) -> Step {
        let name = entry.name.as_str();
        let cancel = CancellationToken::new();
        // Cancels on every exit, including when the whole navigation is dropped.
        let _cancel_on_exit = cancel.clone().drop_guard();
        let scope = StepScope::child(parent);
        let _close_on_exit = CloseOnExit(scope.clone());
        let clock = StepClock::new();

        let next = Continuation {
            chain: self.clone(),
            cursor: cursor + 1,
            clock: clock.clone(),
            scope: scope.clone(),
        };
        let ctx = InterceptContext::new(self.inner.request.clone(), cancel.clone());

        self.trace().invoked.push(name.to_string());
        tracing::trace!(interceptor = %name, cursor, "Invoking interceptor");

        let guard = AssertUnwindSafe(entry.guard().intercept(ctx, next)).catch_unwind().boxed();
        let result = TimedStep::new(guard, entry.timeout(), clock).await;
        scope.closed.store(true, Ordering::SeqCst);

        let started = scope.started.load(Ordering::SeqCst);
        let finished = scope.finished.load(Ordering::SeqCst);

        match result {
            Ok(Ok(Ok(true))) if started && !finished => {
                cancel.cancel();
                self.fail(
                    name,
                    "fault",
                    RouterError::InterceptorFault {
                        name: name.to_string(),
                        message: "continuation abandoned before it finished".to_string(),
                    },
                )
            }
            Ok(Ok(Ok(true))) if started => {
                // This guard's verdict replaces whatever happened downstream.
                let mut trace = self.trace();
                trace.blocker = None;
                trace.failure = None;
                Step::Done(true)
            }
            Ok(Ok(Ok(true))) => Step::Continue,
            Ok(Ok(Ok(false))) => {
                let mut trace = self.trace();
                if trace.blocker.is_none() {
                    tracing::debug!(interceptor = %name, path = %self.inner.request.path, "Interceptor blocked navigation");
                    trace.blocker = Some(name.to_string());
                }
                Step::Done(false)
            }
            Ok(Ok(Err(err))) => {
                cancel.cancel();
                self.fail(
                    name,
                    "fault",
                    RouterError::InterceptorFault {
                        name: name.to_string(),
                        message: err.message,
                    },
                )
            }
            Ok(Err(panic)) => {
                cancel.cancel();
                self.fail(
                    name,
                    "panic",
                    RouterError::InterceptorFault {
                        name: name.to_string(),
                        message: panic_message(panic),
                    },
                )
            }
            Err(_) => {
                cancel.cancel();
                self.fail(
                    name,
                    "timeout",
                    RouterError::InterceptorTimeout {
                        name: name.to_string(),
                        timeout_ms: entry.timeout_ms,
                    },
                )
            }
        }
    }

    fn fail(&self, name: &str, kind: &'static str, error: RouterError) -> Step {
        tracing::warn!(
            interceptor = %name,
            path = %self.inner.request.path,
            error = %error,
            "Interceptor failed, blocking navigation"
        );
        metrics::record_interceptor_failure(name, kind);

        let mut trace = self.trace();
        trace.blocker = Some(name.to_string());
        trace.failure = Some(error);
        Step::Done(false)
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("guard panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("guard panicked: {}", s)
    } else {
        "guard panicked".to_string()
    }
}

/// Handle to the remainder of the chain, given to each guard.
pub struct Continuation {
    chain: InterceptorChain,
    cursor: usize,
    clock: Arc<StepClock>,
    scope: Arc<StepScope>,
}

impl Continuation {
    /// Run every interceptor after the current one and return their combined
    /// verdict. Time spent here is not charged to the calling guard's limit
    /// when the guard awaits it directly.
    ///
    /// Returns false without running anything once the calling step is over.
    pub async fn proceed(self) -> bool {
        // Mark first: the step checks `started` after closing its scope.
        self.scope.started.store(true, Ordering::SeqCst);
        if self.scope.is_closed() {
            return false;
        }
        let _paused = self.clock.pause_if_nested();
        let allowed = self.chain.run_from(self.cursor, self.scope.clone()).await;
        self.scope.finished.store(true, Ordering::SeqCst);
        allowed
    }

    /// Number of interceptors left after the current one.
    pub fn remaining(&self) -> usize {
        self.chain.len().saturating_sub(self.cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GuardError;
    use crate::interceptor::entry::guard_fn;
    use crate::navigation::NavigationParams;
    use std::time::Duration;

    fn request(path: &str) -> Arc<NavigationRequest> {
        Arc::new(NavigationRequest::new(path, NavigationParams::new()))
    }

    fn recording(
        name: &str,
        priority: i32,
        verdict: bool,
        log: Arc<Mutex<Vec<String>>>,
    ) -> Arc<InterceptorEntry> {
        let label = name.to_string();
        let entry = InterceptorEntry::builder(
            name,
            guard_fn(move |_ctx, _next| {
                let log = log.clone();
                let label = label.clone();
                async move {
                    log.lock().unwrap().push(label);
                    Ok(verdict)
                }
            }),
        )
        .priority(priority)
        .global(true)
        .build()
        .unwrap();
        Arc::new(entry)
    }

    #[tokio::test]
    async fn test_priority_order_and_short_circuit() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let low = recording("I2", 50, true, log.clone());
        let high = recording("I1", 100, false, log.clone());

        let chain = InterceptorChain::build(request("/order/42"), &[low, high]);
        assert_eq!(chain.names(), vec!["I1", "I2"]);

        let verdict = chain.proceed().await;
        assert!(!verdict.allowed);
        assert_eq!(*log.lock().unwrap(), vec!["I1"]);
        assert!(matches!(verdict.failure, Some(RouterError::InterceptorBlocked { ref name }) if name == "I1"));
    }

    #[tokio::test]
    async fn test_ties_keep_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = recording("A", 10, true, log.clone());
        let b = recording("B", 10, true, log.clone());
        let c = recording("C", 20, true, log.clone());

        let verdict = InterceptorChain::build(request("/x"), &[a, b, c]).proceed().await;
        assert!(verdict.allowed);
        assert_eq!(*log.lock().unwrap(), vec!["C", "A", "B"]);
        assert_eq!(verdict.invoked, vec!["C", "A", "B"]);
    }

    #[tokio::test]
    async fn test_empty_chain_allows() {
        let verdict = InterceptorChain::build(request("/login"), &[]).proceed().await;
        assert!(verdict.allowed);
        assert!(verdict.invoked.is_empty());
    }

    #[tokio::test]
    async fn test_wrapping_guard_can_override_downstream() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let deny = recording("Deny", 10, false, log.clone());
        let seen = Arc::new(Mutex::new(None));
        let seen_in_guard = seen.clone();
        let wrapper = InterceptorEntry::builder(
            "Override",
            guard_fn(move |_ctx, next| {
                let seen = seen_in_guard.clone();
                async move {
                    let downstream = next.proceed().await;
                    *seen.lock().unwrap() = Some(downstream);
                    Ok(true)
                }
            }),
        )
        .priority(100)
        .global(true)
        .build()
        .unwrap();

        let verdict = InterceptorChain::build(request("/a"), &[deny, Arc::new(wrapper)]).proceed().await;
        assert_eq!(*seen.lock().unwrap(), Some(false));
        assert!(verdict.allowed);
        assert!(verdict.failure.is_none());
    }

    #[tokio::test]
    async fn test_guard_error_fails_closed() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let after = recording("After", 1, true, log.clone());
        let faulty = InterceptorEntry::builder(
            "Faulty",
            guard_fn(|_ctx, _next| async { Err(GuardError::new("session store unreachable")) }),
        )
        .priority(5)
        .global(true)
        .build()
        .unwrap();

        let verdict = InterceptorChain::build(request("/a"), &[Arc::new(faulty), after]).proceed().await;
        assert!(!verdict.allowed);
        assert!(log.lock().unwrap().is_empty());
        match verdict.failure {
            Some(RouterError::InterceptorFault { name, message }) => {
                assert_eq!(name, "Faulty");
                assert_eq!(message, "session store unreachable");
            }
            other => panic!("unexpected failure: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_guard_panic_fails_closed() {
        let panicking = InterceptorEntry::builder(
            "Panics",
            guard_fn(|ctx, _next| async move {
                if ctx.path() == "/boom" {
                    panic!("boom");
                }
                Ok(true)
            }),
        )
        .global(true)
        .build()
        .unwrap();

        let verdict = InterceptorChain::build(request("/boom"), &[Arc::new(panicking)]).proceed().await;
        assert!(!verdict.allowed);
        assert!(matches!(verdict.failure, Some(RouterError::InterceptorFault { ref message, .. }) if message.contains("boom")));
    }

    #[tokio::test]
    async fn test_timeout_cancels_guard_and_skips_rest() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let after = recording("After", 1, true, log.clone());
        let cancelled = Arc::new(AtomicBool::new(false));
        let observed = cancelled.clone();
        let slow = InterceptorEntry::builder(
            "Slow",
            guard_fn(move |ctx, _next| {
                let observed = observed.clone();
                async move {
                    let token = ctx.cancellation().clone();
                    tokio::spawn(async move {
                        token.cancelled().await;
                        observed.store(true, Ordering::SeqCst);
                    });
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    Ok(true)
                }
            }),
        )
        .priority(10)
        .global(true)
        .is_async(true)
        .timeout_ms(50)
        .build()
        .unwrap();

        let started = std::time::Instant::now();
        let verdict = InterceptorChain::build(request("/slow"), &[Arc::new(slow), after]).proceed().await;
        assert!(started.elapsed() < Duration::from_millis(190));
        assert!(!verdict.allowed);
        assert!(log.lock().unwrap().is_empty());
        assert!(matches!(
            verdict.failure,
            Some(RouterError::InterceptorTimeout { ref name, timeout_ms: 50 }) if name == "Slow"
        ));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(cancelled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_downstream_time_is_not_charged_upstream() {
        let slow_inner = InterceptorEntry::builder(
            "SlowInner",
            guard_fn(|_ctx, _next| async {
                tokio::time::sleep(Duration::from_millis(60)).await;
                Ok(true)
            }),
        )
        .priority(1)
        .global(true)
        .timeout_ms(500)
        .build()
        .unwrap();
        let outer = InterceptorEntry::builder("Outer", guard_fn(|_ctx, next| next.proceed().map(Ok)))
            .priority(10)
            .global(true)
            .timeout_ms(30)
            .build()
            .unwrap();

        let verdict = InterceptorChain::build(request("/a"), &[Arc::new(slow_inner), Arc::new(outer)])
            .proceed()
            .await;
        assert!(verdict.allowed);
        assert_eq!(verdict.invoked, vec!["Outer", "SlowInner"]);
    }

    #[tokio::test]
    async fn test_blocker_is_innermost_interceptor() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let inner = recording("Inner", 1, false, log.clone());
        let outer = InterceptorEntry::builder("Outer", guard_fn(|_ctx, next| next.proceed().map(Ok)))
            .priority(10)
            .global(true)
            .build()
            .unwrap();

        let verdict = InterceptorChain::build(request("/a"), &[inner, Arc::new(outer)]).proceed().await;
        assert!(!verdict.allowed);
        assert!(matches!(verdict.failure, Some(RouterError::InterceptorBlocked { ref name }) if name == "Inner"));
    }

    fn sleeper(name: &str, priority: i32, millis: u64, log: Arc<Mutex<Vec<String>>>) -> Arc<InterceptorEntry> {
        let label = name.to_string();
        let entry = InterceptorEntry::builder(
            name,
            guard_fn(move |_ctx, next| {
                let log = log.clone();
                let label = label.clone();
                async move {
                    log.lock().unwrap().push(label);
                    tokio::time::sleep(Duration::from_millis(millis)).await;
                    Ok(next.proceed().await)
                }
            }),
        )
        .priority(priority)
        .global(true)
        .build()
        .unwrap();
        Arc::new(entry)
    }

    #[tokio::test]
    async fn test_abandoned_continuation_fails_closed_without_rerun() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = sleeper("A", 5, 0, log.clone());
        let b = sleeper("B", 1, 100, log.clone());
        let outer = InterceptorEntry::builder(
            "Outer",
            guard_fn(|_ctx, next| async move {
                tokio::select! {
                    downstream = next.proceed() => Ok(downstream),
                    _ = tokio::time::sleep(Duration::from_millis(20)) => Ok(true),
                }
            }),
        )
        .priority(10)
        .global(true)
        .build()
        .unwrap();

        let verdict = InterceptorChain::build(request("/a"), &[a, b, Arc::new(outer)]).proceed().await;
        assert!(!verdict.allowed);
        assert_eq!(verdict.invoked, vec!["Outer", "A", "B"]);
        assert!(matches!(
            verdict.failure,
            Some(RouterError::InterceptorFault { ref name, ref message })
                if name == "Outer" && message.contains("abandoned")
        ));

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(*log.lock().unwrap(), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_escaped_continuation_stops_after_timeout() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = sleeper("A", 5, 100, log.clone());
        let b = recording("B", 1, true, log.clone());
        let outer = InterceptorEntry::builder(
            "Outer",
            guard_fn(|_ctx, next| async move {
                tokio::spawn(next.proceed());
                tokio::time::sleep(Duration::from_millis(500)).await;
                Ok(true)
            }),
        )
        .priority(10)
        .global(true)
        .timeout_ms(30)
        .build()
        .unwrap();

        let started = std::time::Instant::now();
        let verdict = InterceptorChain::build(request("/a"), &[a, b, Arc::new(outer)]).proceed().await;
        assert!(started.elapsed() < Duration::from_millis(90));
        assert!(matches!(verdict.failure, Some(RouterError::InterceptorTimeout { ref name, .. }) if name == "Outer"));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(*log.lock().unwrap(), vec!["A"]);
    }

    #[tokio::test]
    async fn test_continuation_used_after_step_runs_nothing() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let after = recording("After", 1, true, log.clone());
        let stash = Arc::new(Mutex::new(None));
        let slot = stash.clone();
        let outer = InterceptorEntry::builder(
            "Outer",
            guard_fn(move |_ctx, next| {
                let slot = slot.clone();
                async move {
                    *slot.lock().unwrap() = Some(next);
                    Ok(false)
                }
            }),
        )
        .priority(10)
        .global(true)
        .build()
        .unwrap();

        let verdict = InterceptorChain::build(request("/a"), &[after, Arc::new(outer)]).proceed().await;
        assert!(!verdict.allowed);

        let late = stash.lock().unwrap().take().unwrap();
        assert!(!late.proceed().await);
        assert!(log.lock().unwrap().is_empty());
    }
}
