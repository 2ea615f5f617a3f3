//! Navigation executor boundary.
//!
//! The embedding application supplies the executor; it is the only thing
//! that knows what "going to" a destination means on its platform.

use async_trait::async_trait;

use crate::error::ExecutorError;
use crate::navigation::params::NavigationParams;
use crate::routing::TargetHandle;

/// Performs the effect of navigating to a resolved destination.
///
/// Called only after the interceptor chain allowed the request and a route
/// was resolved. The handle is passed through untouched.
#[async_trait]
pub trait NavigationExecutor: Send + Sync {
    async fn execute(&self, target: &TargetHandle, params: &NavigationParams) -> Result<(), ExecutorError>;
}

/// Executor that only records the dispatch in the log. Used by the CLI,
/// where there is no screen to open.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogExecutor;

#[async_trait]
impl NavigationExecutor for LogExecutor {
    async fn execute(&self, target: &TargetHandle, params: &NavigationParams) -> Result<(), ExecutorError> {
        tracing::info!(target = %target, params = params.len(), "Dispatching to destination");
        Ok(())
    }
}
