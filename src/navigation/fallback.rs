//! Fallback coordination.
//!
//! # Responsibilities
//! - Hold the optional, replaceable fallback policy
//! - Delegate failed navigations to it
//!
//! # Design Decisions
//! - No policy installed means "not handled", never an error
//! - No retries here; a policy that wants them implements them itself
//! - Policy swaps are lock-free and safe during navigation

use arc_swap::ArcSwapOption;
use std::sync::Arc;

use crate::navigation::params::NavigationParams;

/// Decides what to do with a navigation that failed.
pub trait FallbackPolicy: Send + Sync {
    /// Returns true if the failure was handled.
    fn handle_fallback(&self, original_path: &str, fallback_path: &str, params: &NavigationParams) -> bool;
}

impl<F> FallbackPolicy for F
where
    F: Fn(&str, &str, &NavigationParams) -> bool + Send + Sync,
{
    fn handle_fallback(&self, original_path: &str, fallback_path: &str, params: &NavigationParams) -> bool {
        self(original_path, fallback_path, params)
    }
}

#[derive(Default)]
pub struct FallbackCoordinator {
    policy: ArcSwapOption<Box<dyn FallbackPolicy>>,
}

impl FallbackCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_policy(&self, policy: impl FallbackPolicy + 'static) {
        let policy: Box<dyn FallbackPolicy> = Box::new(policy);
        self.policy.store(Some(Arc::new(policy)));
    }

    pub fn clear_policy(&self) {
        self.policy.store(None);
    }

    pub fn has_policy(&self) -> bool {
        self.policy.load().is_some()
    }

    /// Delegate to the installed policy. Returns `None` when there is none.
    pub fn try_fallback(&self, original_path: &str, fallback_path: &str, params: &NavigationParams) -> Option<bool> {
        let policy = self.policy.load_full()?;
        let handled = policy.handle_fallback(original_path, fallback_path, params);
        tracing::debug!(
            original_path = %original_path,
            fallback_path = %fallback_path,
            handled,
            "Fallback policy consulted"
        );
        Some(handled)
    }

    /// Delegate to the installed policy; false when there is none.
    pub fn fallback(&self, original_path: &str, fallback_path: &str, params: &NavigationParams) -> bool {
        self.try_fallback(original_path, fallback_path, params).unwrap_or(false)
    }
}

impl std::fmt::Debug for FallbackCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackCoordinator")
            .field("has_policy", &self.has_policy())
            .finish()
    }
}
