//! Interceptor guards and their registration entries.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{GuardError, RouterResult};
use crate::interceptor::chain::Continuation;
use crate::navigation::{NavigationParams, NavigationRequest};
use crate::routing::matcher::{Matcher, PatternSet};
use crate::routing::RouteEntry;

/// What a guard sees of the request it is judging.
#[derive(Debug, Clone)]
pub struct InterceptContext {
    request: Arc<NavigationRequest>,
    cancel: CancellationToken,
}

impl InterceptContext {
    pub(crate) fn new(request: Arc<NavigationRequest>, cancel: CancellationToken) -> Self {
        Self { request, cancel }
    }

    pub fn path(&self) -> &str {
        &self.request.path
    }

    pub fn params(&self) -> &NavigationParams {
        &self.request.params
    }

    pub fn request_id(&self) -> Uuid {
        self.request.id
    }

    /// Route the path resolves to, if any. Guards see it before the
    /// navigation is allowed; the report only carries it afterwards.
    pub fn route(&self) -> Option<&RouteEntry> {
        self.request.route.as_deref()
    }

    /// Cancelled when this step times out, or once the step is over.
    /// Guards that hand work to other tasks should watch it.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}

/// A navigation guard.
///
/// The guard decides by returning a boolean. To observe (or override) the
/// verdict of the interceptors after it, it calls [`Continuation::proceed`];
/// returning `true` without doing so lets the chain continue on its own.
/// An `Err` fails the chain closed, exactly like a timeout.
#[async_trait]
pub trait Interceptor: Send + Sync {
    async fn intercept(&self, ctx: InterceptContext, next: Continuation) -> Result<bool, GuardError>;
}

/// Adapter turning a closure into an [`Interceptor`].
pub struct FnInterceptor<F>(F);

/// Build an interceptor from an async closure.
pub fn guard_fn<F, Fut>(f: F) -> FnInterceptor<F>
where
    F: Fn(InterceptContext, Continuation) -> Fut + Send + Sync,
    Fut: Future<Output = Result<bool, GuardError>> + Send + 'static,
{
    FnInterceptor(f)
}

#[async_trait]
impl<F, Fut> Interceptor for FnInterceptor<F>
where
    F: Fn(InterceptContext, Continuation) -> Fut + Send + Sync,
    Fut: Future<Output = Result<bool, GuardError>> + Send + 'static,
{
    async fn intercept(&self, ctx: InterceptContext, next: Continuation) -> Result<bool, GuardError> {
        (self.0)(ctx, next).await
    }
}

/// A registered interceptor with its matching rules.
#[derive(Clone)]
pub struct InterceptorEntry {
    pub name: String,
    pub description: String,
    /// Sort key, higher runs first.
    pub priority: i32,
    pub group: String,
    pub tags: Vec<String>,
    pub global: bool,
    /// Declares that the guard may suspend.
    pub is_async: bool,
    /// Per-step limit in milliseconds, 0 disables it.
    pub timeout_ms: u64,
    pub enabled: bool,
    patterns: PatternSet,
    excludes: PatternSet,
    guard: Arc<dyn Interceptor>,
}

impl InterceptorEntry {
    pub fn builder(name: impl Into<String>, guard: impl Interceptor + 'static) -> InterceptorBuilder {
        InterceptorBuilder::new(name, Arc::new(guard))
    }

    /// Whether the rules select `path`: global or any pattern, unless an
    /// exclude vetoes it.
    pub fn matches(&self, path: &str) -> bool {
        (self.global || self.patterns.matches(path)) && !self.excludes.matches(path)
    }

    /// Whether this entry joins the chain for `path`.
    pub fn applies_to(&self, path: &str) -> bool {
        self.enabled && self.matches(path)
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    pub fn patterns(&self) -> &[String] {
        self.patterns.sources()
    }

    pub fn excludes(&self) -> &[String] {
        self.excludes.sources()
    }

    pub(crate) fn guard(&self) -> &Arc<dyn Interceptor> {
        &self.guard
    }
}

impl fmt::Debug for InterceptorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorEntry")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("global", &self.global)
            .field("patterns", &self.patterns.sources())
            .field("excludes", &self.excludes.sources())
            .field("is_async", &self.is_async)
            .field("timeout_ms", &self.timeout_ms)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

/// Builder for [`InterceptorEntry`]. Rules are compiled in [`build`].
///
/// [`build`]: InterceptorBuilder::build
pub struct InterceptorBuilder {
    name: String,
    description: String,
    priority: i32,
    group: String,
    tags: Vec<String>,
    global: bool,
    is_async: bool,
    timeout_ms: u64,
    enabled: bool,
    patterns: Vec<String>,
    excludes: Vec<String>,
    guard: Arc<dyn Interceptor>,
}

impl fmt::Debug for InterceptorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorBuilder")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("patterns", &self.patterns)
            .field("excludes", &self.excludes)
            .finish_non_exhaustive()
    }
}

impl InterceptorBuilder {
    pub fn new(name: impl Into<String>, guard: Arc<dyn Interceptor>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            priority: 0,
            group: String::new(),
            tags: Vec::new(),
            global: false,
            is_async: false,
            timeout_ms: 0,
            enabled: true,
            patterns: Vec::new(),
            excludes: Vec::new(),
            guard,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn global(mut self, global: bool) -> Self {
        self.global = global;
        self
    }

    pub fn is_async(mut self, is_async: bool) -> Self {
        self.is_async = is_async;
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn excludes<I, S>(mut self, excludes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excludes = excludes.into_iter().map(Into::into).collect();
        self
    }

    pub fn build(self) -> RouterResult<InterceptorEntry> {
        Ok(InterceptorEntry {
            patterns: PatternSet::compile(&self.patterns)?,
            excludes: PatternSet::compile(&self.excludes)?,
            name: self.name,
            description: self.description,
            priority: self.priority,
            group: self.group,
            tags: self.tags,
            global: self.global,
            is_async: self.is_async,
            timeout_ms: self.timeout_ms,
            enabled: self.enabled,
            guard: self.guard,
        })
    }
}
