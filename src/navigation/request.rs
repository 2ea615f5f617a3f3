//! Navigation requests and their results.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::error::RouterError;
use crate::navigation::params::NavigationParams;
use crate::routing::RouteEntry;

/// One navigation attempt, shared read-only with every interceptor.
#[derive(Debug, Clone)]
pub struct NavigationRequest {
    pub id: Uuid,
    pub path: String,
    pub params: NavigationParams,
    /// Route the path resolved to when the navigation started.
    pub route: Option<Arc<RouteEntry>>,
}

impl NavigationRequest {
    pub fn new(path: impl Into<String>, params: NavigationParams) -> Self {
        Self {
            id: Uuid::new_v4(),
            path: path.into(),
            params,
            route: None,
        }
    }

    pub fn with_route(mut self, route: Option<Arc<RouteEntry>>) -> Self {
        self.route = route;
        self
    }
}

/// Final state of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Chain allowed, route resolved and the executor succeeded.
    Allowed,
    /// An interceptor returned false, timed out or faulted.
    Blocked,
    /// No enabled route matched the path.
    NotFound,
    /// The request failed and the fallback policy handled it.
    FallbackInvoked,
    /// The executor failed after the route was approved.
    ExecutorError,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Allowed => "allowed",
            Outcome::Blocked => "blocked",
            Outcome::NotFound => "not_found",
            Outcome::FallbackInvoked => "fallback_invoked",
            Outcome::ExecutorError => "executor_error",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a request did not reach its destination.
#[derive(Debug)]
pub struct Diagnostic {
    /// Outcome the failure maps to before any fallback handling.
    pub cause: Outcome,
    pub error: RouterError,
}

impl Diagnostic {
    pub(crate) fn new(cause: Outcome, error: RouterError) -> Self {
        Self { cause, error }
    }

    /// Name of the interceptor the failure is attributed to, if any.
    pub fn interceptor(&self) -> Option<&str> {
        match &self.error {
            RouterError::InterceptorBlocked { name }
            | RouterError::InterceptorTimeout { name, .. }
            | RouterError::InterceptorFault { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.error, RouterError::InterceptorTimeout { .. })
    }

    pub fn is_fault(&self) -> bool {
        matches!(self.error, RouterError::InterceptorFault { .. })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.cause, self.error)
    }
}

/// Result of [`Router::navigate`](crate::navigation::Router::navigate).
#[derive(Debug)]
pub struct NavigationReport {
    pub request: Arc<NavigationRequest>,
    pub outcome: Outcome,
    /// Set once resolution succeeded.
    pub resolved_route: Option<Arc<RouteEntry>>,
    pub diagnostic: Option<Diagnostic>,
    /// Names of the interceptors that made up the chain, in execution order.
    pub chain: Vec<String>,
    /// Return value of the fallback policy, `None` when it was not consulted.
    pub fallback_handled: Option<bool>,
    pub elapsed: Duration,
}

impl NavigationReport {
    /// True when the destination was reached.
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Allowed
    }

    /// The underlying cause, even when a fallback handled the failure.
    pub fn cause(&self) -> Outcome {
        self.diagnostic
            .as_ref()
            .map(|d| d.cause)
            .unwrap_or(self.outcome)
    }
}
