//! Route storage and lookup.
//!
//! # Responsibilities
//! - Store literal routes in a concurrent exact-match table
//! - Store pattern routes in registration order
//! - Resolve a concrete path with fixed precedence
//!
//! # Design Decisions
//! - Exact match always wins over any pattern (O(1) lookup first)
//! - Among patterns, first registered wins; priority is never consulted
//! - Pattern list is copy-on-write behind `ArcSwap`: lookups take a
//!   lock-free snapshot, writers publish a new vector
//! - Writers are serialized so the two tables change together
//! - One entry per source path: registering a path replaces any entry,
//!   literal or pattern, with the same source

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use dashmap::DashMap;

use crate::error::RouterResult;
use crate::routing::matcher::{Matcher, PathPattern};
use crate::routing::route::RouteEntry;

#[derive(Debug)]
struct CompiledRoute {
    entry: Arc<RouteEntry>,
    pattern: PathPattern,
}

/// Concurrent route table.
#[derive(Debug)]
pub struct RouteRegistry {
    exact: DashMap<String, Arc<RouteEntry>>,
    patterns: ArcSwap<Vec<Arc<CompiledRoute>>>,
    writer: Mutex<()>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self {
            exact: DashMap::new(),
            patterns: ArcSwap::from_pointee(Vec::new()),
            writer: Mutex::new(()),
        }
    }

    /// Insert a route, replacing any entry registered under the same path.
    ///
    /// Pattern routes are compiled before anything is touched, so a pattern
    /// that fails to compile leaves the registry unchanged.
    pub fn register(&self, entry: RouteEntry) -> RouterResult<Arc<RouteEntry>> {
        let compiled = if entry.is_pattern {
            Some(PathPattern::regex(&entry.path)?)
        } else {
            None
        };
        let entry = Arc::new(entry);

        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        match compiled {
            None => {
                self.remove_patterns(&entry.path);
                self.exact.insert(entry.path.clone(), entry.clone());
            }
            Some(pattern) => {
                self.exact.remove(&entry.path);
                let route = Arc::new(CompiledRoute {
                    entry: entry.clone(),
                    pattern,
                });
                let mut next: Vec<_> = self.patterns.load().iter().cloned().collect();
                // Re-registration keeps the original precedence slot.
                match next.iter_mut().find(|c| c.entry.path == entry.path) {
                    Some(slot) => *slot = route,
                    None => next.push(route),
                }
                self.patterns.store(Arc::new(next));
            }
        }

        Ok(entry)
    }

    /// Remove the exact entry keyed by `path` and every pattern entry whose
    /// source text equals `path`. Returns true if anything was removed.
    pub fn unregister(&self, path: &str) -> bool {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let exact = self.exact.remove(path).is_some();
        let patterns = self.remove_patterns(path);
        exact || patterns
    }

    // Caller must hold the writer lock.
    fn remove_patterns(&self, source: &str) -> bool {
        let current = self.patterns.load();
        if !current.iter().any(|c| c.entry.path == source) {
            return false;
        }
        let next: Vec<_> = current
            .iter()
            .filter(|c| c.entry.path != source)
            .cloned()
            .collect();
        self.patterns.store(Arc::new(next));
        true
    }

    /// Resolve a concrete path. Disabled entries never resolve.
    pub fn resolve(&self, path: &str) -> Option<Arc<RouteEntry>> {
        if let Some(entry) = self.exact.get(path).map(|r| r.value().clone()) {
            if entry.enabled {
                return Some(entry);
            }
        }

        self.patterns
            .load()
            .iter()
            .find(|c| c.entry.enabled && c.pattern.matches(path))
            .map(|c| c.entry.clone())
    }

    /// Look up an entry by its registration key, literal or pattern.
    pub fn get(&self, key: &str) -> Option<Arc<RouteEntry>> {
        if let Some(entry) = self.exact.get(key) {
            return Some(entry.value().clone());
        }
        self.patterns
            .load()
            .iter()
            .find(|c| c.entry.path == key)
            .map(|c| c.entry.clone())
    }

    /// Literal routes whose path matches an ad-hoc regular expression.
    pub fn find_all_by_pattern(&self, pattern: &str) -> RouterResult<Vec<Arc<RouteEntry>>> {
        let matcher = PathPattern::regex(pattern)?;
        let mut found: Vec<_> = self
            .exact
            .iter()
            .filter(|r| matcher.matches(r.key()))
            .map(|r| r.value().clone())
            .collect();
        found.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(found)
    }

    /// Every registered entry: literal routes by descending priority then
    /// path, followed by pattern routes in precedence order.
    pub fn all(&self) -> Vec<Arc<RouteEntry>> {
        let mut routes: Vec<_> = self.exact.iter().map(|r| r.value().clone()).collect();
        routes.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.path.cmp(&b.path)));
        routes.extend(self.patterns.load().iter().map(|c| c.entry.clone()));
        routes
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.patterns.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RouteRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RouterError;

    fn target(route: Option<Arc<RouteEntry>>) -> Option<String> {
        route.map(|r| r.target.to_string())
    }

    #[test]
    fn test_exact_beats_pattern_in_any_order() {
        let registry = RouteRegistry::new();
        registry.register(RouteEntry::pattern(r"/user/.*", "UserPattern")).unwrap();
        registry.register(RouteEntry::new("/user/me", "Me")).unwrap();
        assert_eq!(target(registry.resolve("/user/me")).as_deref(), Some("Me"));

        let registry = RouteRegistry::new();
        registry.register(RouteEntry::new("/user/me", "Me")).unwrap();
        registry.register(RouteEntry::pattern(r"/user/.*", "UserPattern")).unwrap();
        assert_eq!(target(registry.resolve("/user/me")).as_deref(), Some("Me"));
        assert_eq!(target(registry.resolve("/user/42")).as_deref(), Some("UserPattern"));
    }

    #[test]
    fn test_first_registered_pattern_wins() {
        let registry = RouteRegistry::new();
        registry
            .register(RouteEntry::pattern(r"/item/\d+", "First").with_priority(1))
            .unwrap();
        registry
            .register(RouteEntry::pattern(r"/item/.*", "Second").with_priority(100))
            .unwrap();
        assert_eq!(target(registry.resolve("/item/7")).as_deref(), Some("First"));
        assert_eq!(target(registry.resolve("/item/x")).as_deref(), Some("Second"));
    }

    #[test]
    fn test_invalid_pattern_leaves_registry_unchanged() {
        let registry = RouteRegistry::new();
        registry.register(RouteEntry::new("/home", "Home")).unwrap();

        let err = registry.register(RouteEntry::pattern("/home/(", "Broken")).unwrap_err();
        assert!(matches!(err, RouterError::InvalidPattern { .. }));
        assert_eq!(registry.len(), 1);
        assert!(registry.get("/home/(").is_none());
    }

    #[test]
    fn test_unregister_removes_by_source() {
        let registry = RouteRegistry::new();
        registry.register(RouteEntry::pattern(r"/a/\d+", "Digits")).unwrap();
        registry.register(RouteEntry::pattern(r"/a/.*", "Any")).unwrap();

        // Unregistering a concrete path that merely matches removes nothing.
        assert!(!registry.unregister("/a/1"));
        assert_eq!(target(registry.resolve("/a/1")).as_deref(), Some("Digits"));

        assert!(registry.unregister(r"/a/\d+"));
        assert_eq!(target(registry.resolve("/a/1")).as_deref(), Some("Any"));

        assert!(registry.unregister(r"/a/.*"));
        assert!(registry.resolve("/a/1").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_is_idempotent() {
        let registry = RouteRegistry::new();
        let route = RouteEntry::pattern(r"/item/\d+", "Item");
        registry.register(RouteEntry::pattern(r"/item/7", "Seven")).unwrap();
        registry.register(route.clone()).unwrap();
        registry.register(route).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(target(registry.resolve("/item/7")).as_deref(), Some("Seven"));

        registry.register(RouteEntry::new("/login", "Login")).unwrap();
        registry.register(RouteEntry::new("/login", "Login")).unwrap();
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_literal_replaces_pattern_with_same_source() {
        let registry = RouteRegistry::new();
        registry.register(RouteEntry::pattern("/about", "PatternAbout")).unwrap();
        registry.register(RouteEntry::new("/about", "About")).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(target(registry.get("/about")).as_deref(), Some("About"));
    }

    #[test]
    fn test_disabled_routes_do_not_resolve() {
        let registry = RouteRegistry::new();
        registry.register(RouteEntry::new("/beta", "Beta").disabled()).unwrap();
        registry.register(RouteEntry::pattern("/be.*", "Fallthrough")).unwrap();
        assert_eq!(target(registry.resolve("/beta")).as_deref(), Some("Fallthrough"));
        assert!(registry.get("/beta").is_some());
    }

    #[test]
    fn test_find_all_by_pattern_lists_literals() {
        let registry = RouteRegistry::new();
        registry.register(RouteEntry::new("/order/list", "Orders")).unwrap();
        registry.register(RouteEntry::new("/order/detail", "Order")).unwrap();
        registry.register(RouteEntry::new("/login", "Login")).unwrap();
        registry.register(RouteEntry::pattern("/order/.*", "OrderPattern")).unwrap();

        let found = registry.find_all_by_pattern("/order/.*").unwrap();
        let paths: Vec<_> = found.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/order/detail", "/order/list"]);

        assert!(registry.find_all_by_pattern("(").is_err());
    }
}
