//! Interceptor storage.
//!
//! Entries are kept in registration order behind an `ArcSwap`. Chains take a
//! snapshot and sort it themselves, so a registration landing mid-navigation
//! only affects chains built afterwards.

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;

use crate::interceptor::entry::InterceptorEntry;

#[derive(Debug)]
pub struct InterceptorRegistry {
    entries: ArcSwap<Vec<Arc<InterceptorEntry>>>,
    writer: Mutex<()>,
}

impl InterceptorRegistry {
    pub fn new() -> Self {
        Self {
            entries: ArcSwap::from_pointee(Vec::new()),
            writer: Mutex::new(()),
        }
    }

    /// Append an entry. Names are not required to be unique.
    pub fn register(&self, entry: InterceptorEntry) -> Arc<InterceptorEntry> {
        let entry = Arc::new(entry);
        self.update(|entries| entries.push(entry.clone()));
        entry
    }

    /// Remove every entry with this name. Returns how many were removed.
    pub fn unregister(&self, name: &str) -> usize {
        let mut removed = 0;
        self.update(|entries| {
            let before = entries.len();
            entries.retain(|e| e.name != name);
            removed = before - entries.len();
        });
        removed
    }

    /// Remove every entry whose name is in `names` and append `entries`, as
    /// one step. Chains never observe the registry between the two.
    pub fn replace(&self, names: &[String], entries: Vec<InterceptorEntry>) -> usize {
        let entries: Vec<_> = entries.into_iter().map(Arc::new).collect();
        let mut removed = 0;
        self.update(|current| {
            let before = current.len();
            current.retain(|e| !names.contains(&e.name));
            removed = before - current.len();
            current.extend(entries);
        });
        removed
    }

    pub fn clear(&self) {
        self.update(Vec::clear);
    }

    /// Point-in-time view of all entries, in registration order.
    pub fn snapshot(&self) -> Arc<Vec<Arc<InterceptorEntry>>> {
        self.entries.load_full()
    }

    /// All entries in the order a chain would run them.
    pub fn sorted(&self) -> Vec<Arc<InterceptorEntry>> {
        let mut entries: Vec<_> = self.entries.load().iter().cloned().collect();
        entries.sort_by(|a, b| b.priority.cmp(&a.priority));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn update(&self, f: impl FnOnce(&mut Vec<Arc<InterceptorEntry>>)) {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = Vec::clone(&self.entries.load());
        f(&mut next);
        self.entries.store(Arc::new(next));
    }
}

impl Default for InterceptorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
