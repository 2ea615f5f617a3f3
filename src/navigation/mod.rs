//! Navigation: request model, executor boundary, fallback and the router.
//!
//! # Data Flow
//! ```text
//! navigate(path, params)
//!   -> RouteRegistry::resolve (guards can read the route)
//!   -> InterceptorChain (snapshot, priority order)
//!   -> no route: NotFound
//!   -> NavigationExecutor::execute
//!   -> FallbackPolicy on any failure
//!   -> NavigationReport
//! ```

pub mod executor;
pub mod fallback;
pub mod params;
pub mod request;
pub mod router;

pub use executor::{LogExecutor, NavigationExecutor};
pub use fallback::{FallbackCoordinator, FallbackPolicy};
pub use params::{NavigationParams, ParamValue};
pub use request::{Diagnostic, NavigationReport, NavigationRequest, Outcome};
pub use router::{Dispatch, Router};
