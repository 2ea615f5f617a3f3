//! Configuration schema definitions.
//!
//! This module defines the route manifest: router settings, routes and the
//! interceptors built from the stock guards. All types derive Serde traits
//! for deserialization from TOML.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::interceptor::{
    Allow, Deny, InterceptorBuilder, InterceptorEntry, Interceptor, RequireParams, RouteRequirements,
};
use crate::registration::{RegistrationRecord, RegistrationSource};
use crate::routing::RouteEntry;

/// Root of a route manifest.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Router-wide switches.
    pub router: RouterSettings,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// Route definitions mapping paths to destinations.
    pub routes: Vec<RouteConfig>,

    /// Interceptors guarding those routes.
    pub interceptors: Vec<InterceptorConfig>,
}

/// Router-wide settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterSettings {
    /// When false, navigation skips the interceptor chain entirely.
    pub interceptors_enabled: bool,

    /// Timeout given to manifest interceptors that do not set their own.
    pub default_interceptor_timeout_ms: u64,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            interceptors_enabled: true,
            default_interceptor_timeout_ms: 3000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// One `[[routes]]` entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Literal path, or a regular expression when `pattern` is set.
    pub path: String,

    /// Opaque destination handed to the executor.
    pub target: String,

    #[serde(default)]
    pub description: String,

    /// Higher = listed first. Pattern routes still match in manifest order.
    #[serde(default)]
    pub priority: i32,

    /// Treat `path` as a regular expression.
    #[serde(default)]
    pub pattern: bool,

    /// Path handed to the fallback policy when navigation to this route fails.
    #[serde(default)]
    pub fallback: Option<String>,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub group: String,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Parameters a request must carry, enforced by `route_requirements`.
    #[serde(default)]
    pub required_params: Vec<String>,

    /// Permissions a request must hold, enforced by `route_requirements`.
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Which stock guard an `[[interceptors]]` entry uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardKind {
    Allow,
    Deny,
    /// Blocks unless every name in `keys` is present in the parameters.
    RequireParams,
    /// Enforces `required_params` and `permissions` of the resolved route.
    RouteRequirements,
}

/// One `[[interceptors]]` entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InterceptorConfig {
    pub name: String,

    pub kind: GuardKind,

    /// Parameter names for `require_params`.
    #[serde(default)]
    pub keys: Vec<String>,

    /// Parameter holding granted permissions for `route_requirements`.
    #[serde(default)]
    pub permissions_key: Option<String>,

    #[serde(default)]
    pub description: String,

    /// Higher = runs earlier.
    #[serde(default)]
    pub priority: i32,

    #[serde(default)]
    pub group: String,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Apply to every path not excluded.
    #[serde(default)]
    pub global: bool,

    /// Exact paths or globs this interceptor applies to.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Exact paths or globs this interceptor never applies to.
    #[serde(default)]
    pub excludes: Vec<String>,

    #[serde(default)]
    pub is_async: bool,

    /// Falls back to `router.default_interceptor_timeout_ms`. Zero disables.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl RouteConfig {
    pub fn to_entry(&self) -> RouteEntry {
        let mut entry = if self.pattern {
            RouteEntry::pattern(self.path.as_str(), self.target.as_str())
        } else {
            RouteEntry::new(self.path.as_str(), self.target.as_str())
        }
        .with_description(self.description.as_str())
        .with_priority(self.priority)
        .with_group(self.group.as_str())
        .with_tags(self.tags.iter().cloned())
        .with_required_params(self.required_params.iter().cloned())
        .with_permissions(self.permissions.iter().cloned());

        if let Some(fallback) = &self.fallback {
            entry = entry.with_fallback(fallback.as_str());
        }
        if !self.enabled {
            entry = entry.disabled();
        }
        entry
    }
}

impl InterceptorConfig {
    fn guard(&self) -> Arc<dyn Interceptor> {
        match self.kind {
            GuardKind::Allow => Arc::new(Allow),
            GuardKind::Deny => Arc::new(Deny),
            GuardKind::RequireParams => Arc::new(RequireParams::new(self.keys.iter().cloned())),
            GuardKind::RouteRequirements => match &self.permissions_key {
                Some(key) => Arc::new(RouteRequirements::with_permissions_key(key.as_str())),
                None => Arc::new(RouteRequirements::new()),
            },
        }
    }

    pub fn to_builder(&self, settings: &RouterSettings) -> InterceptorBuilder {
        InterceptorBuilder::new(self.name.as_str(), self.guard())
            .description(self.description.as_str())
            .priority(self.priority)
            .group(self.group.as_str())
            .tags(self.tags.iter().cloned())
            .global(self.global)
            .patterns(self.patterns.iter().cloned())
            .excludes(self.excludes.iter().cloned())
            .is_async(self.is_async)
            .timeout_ms(self.timeout_ms.unwrap_or(settings.default_interceptor_timeout_ms))
            .enabled(self.enabled)
    }
}

impl RouterConfig {
    /// Interceptors built from this manifest. Fails on the first rule that
    /// does not compile; run validation first for a full report.
    pub fn build_interceptors(&self) -> crate::error::RouterResult<Vec<InterceptorEntry>> {
        self.interceptors
            .iter()
            .map(|i| i.to_builder(&self.router).build())
            .collect()
    }
}

impl RegistrationSource for RouterConfig {
    fn records(&self) -> Vec<RegistrationRecord> {
        let routes = self.routes.iter().map(|r| RegistrationRecord::Route(r.to_entry()));
        let interceptors = self
            .interceptors
            .iter()
            .map(|i| RegistrationRecord::Interceptor(i.to_builder(&self.router)));
        routes.chain(interceptors).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
        [router]
        default_interceptor_timeout_ms = 500

        [[routes]]
        path = "/login"
        target = "LoginScreen"

        [[routes]]
        path = '^/item/\d+$'
        target = "ItemScreen"
        pattern = true
        fallback = "/home"

        [[interceptors]]
        name = "Auth"
        kind = "require_params"
        keys = ["session"]
        global = true
        excludes = ["/login", "/public/*"]
        priority = 100
    "#;

    #[test]
    fn test_parse_manifest_with_defaults() {
        let config: RouterConfig = toml::from_str(MANIFEST).unwrap();
        assert!(config.router.interceptors_enabled);
        assert_eq!(config.routes.len(), 2);
        assert!(config.routes[0].enabled);
        assert!(config.routes[1].pattern);
        assert_eq!(config.interceptors[0].kind, GuardKind::RequireParams);
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_records_apply_default_timeout() {
        let config: RouterConfig = toml::from_str(MANIFEST).unwrap();
        let interceptors = config.build_interceptors().unwrap();
        assert_eq!(interceptors[0].timeout_ms, 500);
        assert!(interceptors[0].applies_to("/profile"));
        assert!(!interceptors[0].applies_to("/public/faq"));

        let records = config.records();
        assert_eq!(records.len(), 3);
        let RegistrationRecord::Route(item) = &records[1] else {
            panic!("expected a route record");
        };
        assert!(item.is_pattern);
        assert_eq!(item.fallback_or_empty(), "/home");
    }

    #[test]
    fn test_route_requirements_from_manifest() {
        let manifest = r#"
            [[routes]]
            path = "/admin"
            target = "AdminScreen"
            required_params = ["session"]
            permissions = ["admin"]

            [[interceptors]]
            name = "Permissions"
            kind = "route_requirements"
            global = true
        "#;
        let config: RouterConfig = toml::from_str(manifest).unwrap();
        assert_eq!(config.interceptors[0].kind, GuardKind::RouteRequirements);
        assert!(config.interceptors[0].permissions_key.is_none());

        let route = config.routes[0].to_entry();
        assert_eq!(route.required_params, vec!["session".to_string()]);
        assert_eq!(route.permissions, vec!["admin".to_string()]);
        assert!(config.build_interceptors().is_ok());
    }

    #[test]
    fn test_unknown_guard_kind_is_rejected() {
        let manifest = r#"
            [[interceptors]]
            name = "X"
            kind = "maybe"
        "#;
        assert!(toml::from_str::<RouterConfig>(manifest).is_err());
    }
}
