//! Router facade.
//!
//! # Responsibilities
//! - Own the route and interceptor registries
//! - Run one navigation end to end: chain, resolve, execute, fall back
//! - Turn every per-request failure into an outcome, never a panic or error
//!
//! # Design Decisions
//! - One `Router` per process, built by the composition root and shared
//!   via `Arc`; nothing is global
//! - Every method takes `&self`: registration is safe while navigations
//!   are in flight
//! - The route is resolved once, up front, so guards can read its
//!   requirements; a blocked or unmatched request still reports no route
//!   and hands `""` to the fallback policy

use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;

use crate::config::RouterSettings;
use crate::error::{RouterError, RouterResult};
use crate::interceptor::{ChainVerdict, InterceptorChain, InterceptorEntry, InterceptorRegistry};
use crate::navigation::executor::NavigationExecutor;
use crate::navigation::fallback::{FallbackCoordinator, FallbackPolicy};
use crate::navigation::params::NavigationParams;
use crate::navigation::request::{Diagnostic, NavigationReport, NavigationRequest, Outcome};
use crate::observability::metrics;
use crate::registration::{RegistrationRecord, RegistrationSource, RegistrationSummary};
use crate::routing::{RouteEntry, RouteRegistry};

/// A resolved destination that has not been executed.
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub route: Arc<RouteEntry>,
    pub params: NavigationParams,
}

pub struct Router {
    routes: RouteRegistry,
    interceptors: InterceptorRegistry,
    fallback: FallbackCoordinator,
    executor: Arc<dyn NavigationExecutor>,
    settings: RouterSettings,
}

impl Router {
    pub fn new(executor: impl NavigationExecutor + 'static) -> Self {
        Self::with_settings(executor, RouterSettings::default())
    }

    pub fn with_settings(executor: impl NavigationExecutor + 'static, settings: RouterSettings) -> Self {
        Self {
            routes: RouteRegistry::new(),
            interceptors: InterceptorRegistry::new(),
            fallback: FallbackCoordinator::new(),
            executor: Arc::new(executor),
            settings,
        }
    }

    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    // ---- routes -------------------------------------------------------

    /// Register a route. A pattern that does not compile is rejected and the
    /// table is left as it was.
    pub fn register_route(&self, entry: RouteEntry) -> RouterResult<Arc<RouteEntry>> {
        match self.routes.register(entry) {
            Ok(route) => {
                tracing::info!(
                    path = %route.path,
                    target = %route.target,
                    pattern = route.is_pattern,
                    "Route registered"
                );
                metrics::record_routes_registered(self.routes.len());
                Ok(route)
            }
            Err(e) => {
                tracing::error!(error = %e, "Route registration rejected");
                Err(e)
            }
        }
    }

    pub fn unregister_route(&self, path: &str) -> bool {
        let removed = self.routes.unregister(path);
        if removed {
            tracing::info!(path = %path, "Route unregistered");
            metrics::record_routes_registered(self.routes.len());
        } else {
            tracing::debug!(path = %path, "No route to unregister");
        }
        removed
    }

    /// True if `path` resolves to an enabled route.
    pub fn has_route(&self, path: &str) -> bool {
        self.routes.resolve(path).is_some()
    }

    /// The route `path` resolves to, or the route registered under `path`
    /// itself. Disabled routes are reported this way even though they never
    /// resolve.
    pub fn route_info(&self, path: &str) -> Option<Arc<RouteEntry>> {
        self.routes.resolve(path).or_else(|| self.routes.get(path))
    }

    pub fn all_routes(&self) -> Vec<Arc<RouteEntry>> {
        self.routes.all()
    }

    /// Literal routes matching an ad-hoc regular expression.
    pub fn find_routes_by_pattern(&self, pattern: &str) -> RouterResult<Vec<Arc<RouteEntry>>> {
        self.routes.find_all_by_pattern(pattern)
    }

    /// Resolve without running interceptors or the executor.
    pub fn build_dispatch(&self, path: &str, params: NavigationParams) -> Option<Dispatch> {
        self.routes.resolve(path).map(|route| Dispatch { route, params })
    }

    // ---- interceptors -------------------------------------------------

    pub fn register_interceptor(&self, entry: InterceptorEntry) -> Arc<InterceptorEntry> {
        let entry = self.interceptors.register(entry);
        tracing::info!(
            interceptor = %entry.name,
            priority = entry.priority,
            global = entry.global,
            "Interceptor registered"
        );
        entry
    }

    /// Remove every interceptor with this name.
    pub fn unregister_interceptor(&self, name: &str) -> usize {
        let removed = self.interceptors.unregister(name);
        tracing::info!(interceptor = %name, removed, "Interceptor unregistered");
        removed
    }

    /// Interceptors in execution order.
    pub fn interceptors(&self) -> Vec<Arc<InterceptorEntry>> {
        self.interceptors.sorted()
    }

    /// Swap out the named interceptors for `entries` in one step, so no
    /// navigation runs with neither set in place.
    pub fn replace_interceptors(&self, names: &[String], entries: Vec<InterceptorEntry>) -> usize {
        let added = entries.len();
        let removed = self.interceptors.replace(names, entries);
        tracing::info!(removed, added, "Interceptors replaced");
        removed
    }

    pub fn clear_interceptors(&self) {
        self.interceptors.clear();
        tracing::info!("All interceptors cleared");
    }

    // ---- fallback -----------------------------------------------------

    pub fn set_fallback_policy(&self, policy: impl FallbackPolicy + 'static) {
        self.fallback.set_policy(policy);
        tracing::debug!("Fallback policy set");
    }

    pub fn clear_fallback_policy(&self) {
        self.fallback.clear_policy();
    }

    pub fn fallback(&self, original_path: &str, fallback_path: &str, params: &NavigationParams) -> bool {
        self.fallback.fallback(original_path, fallback_path, params)
    }

    // ---- bulk registration --------------------------------------------

    /// Apply a batch of registration records. A failing record is reported
    /// in the summary and does not stop the rest of the batch.
    pub fn register_all<I>(&self, records: I) -> RegistrationSummary
    where
        I: IntoIterator<Item = RegistrationRecord>,
    {
        let mut summary = RegistrationSummary::default();
        for record in records {
            match record {
                RegistrationRecord::Route(entry) => match self.register_route(entry) {
                    Ok(_) => summary.routes += 1,
                    Err(e) => summary.errors.push(e),
                },
                RegistrationRecord::Interceptor(builder) => match builder.build() {
                    Ok(entry) => {
                        self.register_interceptor(entry);
                        summary.interceptors += 1;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Interceptor registration rejected");
                        summary.errors.push(e);
                    }
                },
            }
        }

        tracing::info!(
            routes = summary.routes,
            interceptors = summary.interceptors,
            errors = summary.errors.len(),
            "Bulk registration complete"
        );
        summary
    }

    pub fn register_source(&self, source: &dyn RegistrationSource) -> RegistrationSummary {
        self.register_all(source.records())
    }

    // ---- navigation ---------------------------------------------------

    /// Navigate to `path`. Always returns a definite outcome.
    pub async fn navigate(&self, path: &str, params: NavigationParams) -> NavigationReport {
        let route = self.routes.resolve(path);
        let request = Arc::new(NavigationRequest::new(path, params).with_route(route));
        let span = tracing::info_span!("navigate", request_id = %request.id, path = %request.path);
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: Arc<NavigationRequest>) -> NavigationReport {
        let started = Instant::now();

        let (chain, verdict) = if self.settings.interceptors_enabled {
            let chain = InterceptorChain::build(request.clone(), &self.interceptors.snapshot());
            let names = chain.names();
            tracing::debug!(interceptors = names.len(), "Interceptor chain built");
            (names, chain.proceed().await)
        } else {
            let verdict = ChainVerdict {
                allowed: true,
                failure: None,
                invoked: Vec::new(),
            };
            (Vec::new(), verdict)
        };

        if !verdict.allowed {
            let error = verdict.failure.unwrap_or_else(|| RouterError::InterceptorBlocked {
                name: String::new(),
            });
            let diagnostic = Diagnostic::new(Outcome::Blocked, error);
            return self.fail(request, None, diagnostic, chain, started);
        }

        let Some(route) = request.route.clone() else {
            let diagnostic = Diagnostic::new(
                Outcome::NotFound,
                RouterError::RouteNotFound {
                    path: request.path.clone(),
                },
            );
            return self.fail(request, None, diagnostic, chain, started);
        };

        match self.executor.execute(&route.target, &request.params).await {
            Ok(()) => {
                tracing::info!(target = %route.target, "Navigation successful");
                metrics::record_navigation(Outcome::Allowed, started);
                NavigationReport {
                    request,
                    outcome: Outcome::Allowed,
                    resolved_route: Some(route),
                    diagnostic: None,
                    chain,
                    fallback_handled: None,
                    elapsed: started.elapsed(),
                }
            }
            Err(e) => {
                let diagnostic = Diagnostic::new(Outcome::ExecutorError, e.into());
                self.fail(request, Some(route), diagnostic, chain, started)
            }
        }
    }

    fn fail(
        &self,
        request: Arc<NavigationRequest>,
        route: Option<Arc<RouteEntry>>,
        diagnostic: Diagnostic,
        chain: Vec<String>,
        started: Instant,
    ) -> NavigationReport {
        tracing::warn!(cause = %diagnostic.cause, error = %diagnostic.error, "Navigation failed");

        let fallback_path = route.as_deref().map(RouteEntry::fallback_or_empty).unwrap_or("");
        let handled = self
            .fallback
            .try_fallback(&request.path, fallback_path, &request.params);

        let outcome = match handled {
            Some(true) => Outcome::FallbackInvoked,
            _ => diagnostic.cause,
        };
        metrics::record_navigation(outcome, started);

        NavigationReport {
            request,
            outcome,
            resolved_route: route,
            diagnostic: Some(diagnostic),
            chain,
            fallback_handled: handled,
            elapsed: started.elapsed(),
        }
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes.len())
            .field("interceptors", &self.interceptors.len())
            .field("fallback", &self.fallback)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
