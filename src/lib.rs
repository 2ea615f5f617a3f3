//! Waypoint: path-based navigation routing with an interceptor chain.
//!
//! Routes map literal paths or regular expressions to opaque destination
//! handles. Before a navigation is dispatched it passes through a
//! priority-ordered chain of interceptors, any of which can block it.
//! Failures are handed to a pluggable fallback policy.

pub mod config;
pub mod error;
pub mod interceptor;
pub mod navigation;
pub mod observability;
pub mod registration;
pub mod routing;

pub use config::RouterConfig;
pub use error::{ExecutorError, GuardError, RouterError, RouterResult};
pub use interceptor::{guard_fn, Continuation, InterceptContext, Interceptor, InterceptorEntry};
pub use navigation::{NavigationExecutor, NavigationParams, NavigationReport, Outcome, Router};
pub use registration::{RegistrationRecord, RegistrationSource, RegistrationSummary};
pub use routing::{RouteEntry, TargetHandle};
