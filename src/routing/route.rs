//! Route entries and destination handles.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Opaque reference to a navigation destination.
///
/// The router never looks inside a handle; it only hands it to the
/// [`NavigationExecutor`](crate::navigation::NavigationExecutor).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetHandle(Arc<str>);

impl TargetHandle {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetHandle {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A registered route.
///
/// Immutable once created; replace it by registering a new entry under the
/// same path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    /// Registration key: a literal path, or a regex when `is_pattern` is set.
    pub path: String,
    pub target: TargetHandle,
    #[serde(default)]
    pub description: String,
    /// Higher wins tie-breaks in listings. Does not affect resolution order.
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub is_pattern: bool,
    #[serde(default)]
    pub fallback_path: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Parameters a request must carry to reach this route.
    #[serde(default)]
    pub required_params: Vec<String>,
    /// Permissions a request must hold to reach this route.
    #[serde(default)]
    pub permissions: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

impl RouteEntry {
    /// Create an enabled literal route.
    pub fn new(path: impl Into<String>, target: impl Into<TargetHandle>) -> Self {
        Self {
            path: path.into(),
            target: target.into(),
            description: String::new(),
            priority: 0,
            is_pattern: false,
            fallback_path: None,
            enabled: true,
            group: String::new(),
            tags: Vec::new(),
            required_params: Vec::new(),
            permissions: Vec::new(),
        }
    }

    /// Create an enabled route whose path is a regular expression.
    pub fn pattern(pattern: impl Into<String>, target: impl Into<TargetHandle>) -> Self {
        Self {
            is_pattern: true,
            ..Self::new(pattern, target)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_fallback(mut self, fallback_path: impl Into<String>) -> Self {
        self.fallback_path = Some(fallback_path.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_required_params<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_params = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    /// True when the route declares neither parameters nor permissions.
    pub fn is_unrestricted(&self) -> bool {
        self.required_params.is_empty() && self.permissions.is_empty()
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Fallback path handed to the fallback policy, empty when unset.
    pub fn fallback_or_empty(&self) -> &str {
        self.fallback_path.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let route = RouteEntry::new("/login", "LoginScreen")
            .with_description("sign in")
            .with_fallback("/home")
            .with_tags(["auth"]);
        assert!(!route.is_pattern);
        assert!(route.enabled);
        assert_eq!(route.target.as_str(), "LoginScreen");
        assert_eq!(route.fallback_or_empty(), "/home");
        assert_eq!(route.tags, vec!["auth".to_string()]);

        let pattern = RouteEntry::pattern(r"^/item/\d+$", "ItemScreen").disabled();
        assert!(pattern.is_pattern);
        assert!(!pattern.enabled);
        assert_eq!(pattern.fallback_or_empty(), "");
        assert!(pattern.is_unrestricted());
    }

    #[test]
    fn test_requirements_default_when_absent() {
        let route: RouteEntry =
            serde_json::from_str(r#"{"path": "/admin", "target": "Admin", "permissions": ["admin"]}"#).unwrap();
        assert!(route.enabled);
        assert!(route.required_params.is_empty());
        assert_eq!(route.permissions, vec!["admin".to_string()]);
        assert!(!route.is_unrestricted());
    }
}
