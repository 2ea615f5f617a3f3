//! Built-in guards, usable from code and from the manifest.

use async_trait::async_trait;

use crate::error::GuardError;
use crate::interceptor::chain::Continuation;
use crate::interceptor::entry::{InterceptContext, Interceptor};
use crate::navigation::{NavigationParams, ParamValue};

/// Always lets the request through.
#[derive(Debug, Clone, Copy, Default)]
pub struct Allow;

#[async_trait]
impl Interceptor for Allow {
    async fn intercept(&self, _ctx: InterceptContext, _next: Continuation) -> Result<bool, GuardError> {
        Ok(true)
    }
}

/// Always blocks. Useful for switching off a section of the app.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deny;

#[async_trait]
impl Interceptor for Deny {
    async fn intercept(&self, ctx: InterceptContext, _next: Continuation) -> Result<bool, GuardError> {
        tracing::debug!(path = %ctx.path(), "Path denied");
        Ok(false)
    }
}

/// Blocks unless every listed parameter is present, e.g. a session token
/// for pages that need a signed-in user.
#[derive(Debug, Clone, Default)]
pub struct RequireParams {
    keys: Vec<String>,
}

impl RequireParams {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl Interceptor for RequireParams {
    async fn intercept(&self, ctx: InterceptContext, _next: Continuation) -> Result<bool, GuardError> {
        let missing: Vec<&str> = self
            .keys
            .iter()
            .filter(|k| !ctx.params().contains_key(k))
            .map(String::as_str)
            .collect();

        if missing.is_empty() {
            Ok(true)
        } else {
            tracing::debug!(path = %ctx.path(), missing = ?missing, "Required parameters missing");
            Ok(false)
        }
    }
}

/// Enforces the requirements declared on the resolved route: every
/// `required_params` key must be present, and every `permissions` entry must
/// be held by the request.
///
/// Held permissions are read from one parameter, `permissions` by default,
/// as a string or a string array. Paths with no route pass through; the
/// router reports them as not found.
#[derive(Debug, Clone)]
pub struct RouteRequirements {
    permissions_key: String,
}

impl RouteRequirements {
    pub const DEFAULT_PERMISSIONS_KEY: &'static str = "permissions";

    pub fn new() -> Self {
        Self::with_permissions_key(Self::DEFAULT_PERMISSIONS_KEY)
    }

    pub fn with_permissions_key(key: impl Into<String>) -> Self {
        Self {
            permissions_key: key.into(),
        }
    }

    fn holds(&self, params: &NavigationParams, permission: &str) -> bool {
        match params.get(&self.permissions_key) {
            Some(ParamValue::Str(held)) => held == permission,
            Some(ParamValue::StrArray(held)) => held.iter().any(|p| p == permission),
            _ => false,
        }
    }
}

impl Default for RouteRequirements {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Interceptor for RouteRequirements {
    async fn intercept(&self, ctx: InterceptContext, _next: Continuation) -> Result<bool, GuardError> {
        let Some(route) = ctx.route() else {
            return Ok(true);
        };

        let missing: Vec<&str> = route
            .required_params
            .iter()
            .filter(|k| !ctx.params().contains_key(k))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            tracing::debug!(path = %ctx.path(), route = %route.path, missing = ?missing, "Route parameters missing");
            return Ok(false);
        }

        let denied: Vec<&str> = route
            .permissions
            .iter()
            .filter(|p| !self.holds(ctx.params(), p))
            .map(String::as_str)
            .collect();
        if !denied.is_empty() {
            tracing::debug!(path = %ctx.path(), route = %route.path, denied = ?denied, "Route permissions missing");
            return Ok(false);
        }

        Ok(true)
    }
}
