//! Error types shared across the routing core.

use thiserror::Error;

/// Errors raised by the router and its registries.
///
/// Registration errors are returned synchronously to the caller. The
/// per-request variants never escape [`Router::navigate`]; they are carried
/// inside a [`Diagnostic`] instead.
///
/// [`Router::navigate`]: crate::navigation::Router::navigate
/// [`Diagnostic`]: crate::navigation::Diagnostic
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("invalid pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("no route registered for `{path}`")]
    RouteNotFound { path: String },

    #[error("navigation blocked by interceptor `{name}`")]
    InterceptorBlocked { name: String },

    #[error("interceptor `{name}` did not complete within {timeout_ms}ms")]
    InterceptorTimeout { name: String, timeout_ms: u64 },

    #[error("interceptor `{name}` failed: {message}")]
    InterceptorFault { name: String, message: String },

    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

impl RouterError {
    pub(crate) fn invalid_pattern(pattern: &str, reason: impl ToString) -> Self {
        RouterError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Failure reported by a [`NavigationExecutor`](crate::navigation::NavigationExecutor).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("executor failed for target `{target}`: {message}")]
pub struct ExecutorError {
    pub target: String,
    pub message: String,
}

impl ExecutorError {
    pub fn new(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            message: message.into(),
        }
    }
}

/// Fault raised by an interceptor guard.
///
/// A guard returning this is treated exactly like a timeout: the chain fails
/// closed and the message is recorded against the interceptor's name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct GuardError {
    pub message: String,
}

impl GuardError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<&str> for GuardError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for GuardError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

pub type RouterResult<T> = Result<T, RouterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_interceptor() {
        let err = RouterError::InterceptorTimeout {
            name: "Auth".into(),
            timeout_ms: 50,
        };
        assert_eq!(err.to_string(), "interceptor `Auth` did not complete within 50ms");

        let err: RouterError = ExecutorError::new("LoginScreen", "activity missing").into();
        assert!(matches!(err, RouterError::Executor(_)));
        assert!(err.to_string().contains("LoginScreen"));
    }
}
