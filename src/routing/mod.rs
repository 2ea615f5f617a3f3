//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (startup or any time later):
//!     RouteEntry
//!     → matcher.rs (compile regex when is_pattern)
//!     → registry.rs (exact table or ordered pattern list)
//!
//! Lookup (per navigation, after the interceptor chain allows):
//!     path
//!     → exact table (O(1))
//!     → pattern list scan, first registered match wins
//!     → Return: matched RouteEntry or None
//! ```
//!
//! # Design Decisions
//! - Exact precedence is fixed and not configurable
//! - Route priority never changes lookup order
//! - Lookups never block on writers

pub mod matcher;
pub mod registry;
pub mod route;

pub use matcher::{Matcher, PathPattern, PatternSet};
pub use registry::RouteRegistry;
pub use route::{RouteEntry, TargetHandle};
