//! Shared utilities for integration tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use waypoint::navigation::{NavigationExecutor, NavigationParams, Router};
use waypoint::{ExecutorError, TargetHandle};

/// Executor that records every dispatch and fails for selected targets.
#[derive(Clone, Default)]
pub struct RecordingExecutor {
    calls: Arc<Mutex<Vec<(String, NavigationParams)>>>,
    failing: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `execute` fail for this target from now on.
    pub fn fail_for(&self, target: &str) {
        self.failing.lock().unwrap().push(target.to_string());
    }

    pub fn targets(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(t, _)| t.clone()).collect()
    }

    pub fn last_params(&self) -> Option<NavigationParams> {
        self.calls.lock().unwrap().last().map(|(_, p)| p.clone())
    }
}

#[async_trait]
impl NavigationExecutor for RecordingExecutor {
    async fn execute(&self, target: &TargetHandle, params: &NavigationParams) -> Result<(), ExecutorError> {
        self.calls.lock().unwrap().push((target.to_string(), params.clone()));
        if self.failing.lock().unwrap().iter().any(|t| t == target.as_str()) {
            return Err(ExecutorError::new(target.as_str(), "destination unavailable"));
        }
        Ok(())
    }
}

/// One call to the fallback policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackCall {
    pub original_path: String,
    pub fallback_path: String,
}

/// Install a fallback policy that records its calls and answers `handled`.
#[allow(dead_code)]
pub fn recording_fallback(router: &Router, handled: bool) -> Arc<Mutex<Vec<FallbackCall>>> {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let seen = calls.clone();
    router.set_fallback_policy(move |original: &str, fallback: &str, _: &NavigationParams| {
        seen.lock().unwrap().push(FallbackCall {
            original_path: original.to_string(),
            fallback_path: fallback.to_string(),
        });
        handled
    });
    calls
}

/// A router wired to a fresh recording executor.
#[allow(dead_code)]
pub fn router() -> (Router, RecordingExecutor) {
    let executor = RecordingExecutor::new();
    (Router::new(executor.clone()), executor)
}
