//! Bulk registration.
//!
//! Anything that can describe routes and interceptors (a manifest, a plugin,
//! generated tables) implements [`RegistrationSource`] and is applied in one
//! call with [`Router::register_source`](crate::navigation::Router::register_source).

use crate::error::RouterError;
use crate::interceptor::InterceptorBuilder;
use crate::routing::RouteEntry;

/// One item to register.
#[derive(Debug)]
pub enum RegistrationRecord {
    Route(RouteEntry),
    /// Built at registration time, so pattern errors land in the summary.
    Interceptor(InterceptorBuilder),
}

impl From<RouteEntry> for RegistrationRecord {
    fn from(entry: RouteEntry) -> Self {
        RegistrationRecord::Route(entry)
    }
}

impl From<InterceptorBuilder> for RegistrationRecord {
    fn from(builder: InterceptorBuilder) -> Self {
        RegistrationRecord::Interceptor(builder)
    }
}

/// A provider of registration records.
pub trait RegistrationSource {
    fn records(&self) -> Vec<RegistrationRecord>;
}

/// What a bulk registration did.
#[derive(Debug, Default)]
pub struct RegistrationSummary {
    pub routes: usize,
    pub interceptors: usize,
    /// Records that were rejected, in input order.
    pub errors: Vec<RouterError>,
}

impl RegistrationSummary {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
