//! Manifest watcher for hot reload.
//!
//! A manifest change is loaded and validated off the watcher thread, then
//! sent to whoever owns the router. [`apply_config`] moves a live router
//! from one manifest to the next without a window where routes or guards
//! are missing.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::RouterConfig;
use crate::navigation::Router;
use crate::registration::RegistrationSummary;

/// A watcher that monitors the manifest file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<RouterConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for validated manifests.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<RouterConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file in a background thread. Dropping the returned
    /// watcher stops it.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!("Manifest change detected, reloading...");
                        match load_config(&path) {
                            Ok(new_config) => {
                                let _ = tx.send(new_config);
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "Failed to reload manifest. Keeping current routes.");
                            }
                        }
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Manifest watcher started");
        Ok(watcher)
    }
}

/// Move `router` from `previous` (if any) to `next`.
///
/// New routes are registered before stale ones are removed, and the
/// manifest's interceptors are swapped in a single step. Routes and
/// interceptors registered in code under other names are left alone.
/// Router settings are fixed at construction and are not reloaded.
pub fn apply_config(router: &Router, previous: Option<&RouterConfig>, next: &RouterConfig) -> RegistrationSummary {
    let mut summary = RegistrationSummary::default();

    for route in &next.routes {
        match router.register_route(route.to_entry()) {
            Ok(_) => summary.routes += 1,
            Err(e) => summary.errors.push(e),
        }
    }

    if let Some(previous) = previous {
        let keep: HashSet<&str> = next.routes.iter().map(|r| r.path.as_str()).collect();
        for stale in previous.routes.iter().filter(|r| !keep.contains(r.path.as_str())) {
            router.unregister_route(&stale.path);
        }
    }

    let mut entries = Vec::with_capacity(next.interceptors.len());
    for interceptor in &next.interceptors {
        match interceptor.to_builder(&next.router).build() {
            Ok(entry) => entries.push(entry),
            Err(e) => summary.errors.push(e),
        }
    }
    summary.interceptors = entries.len();

    let mut names: Vec<String> = next.interceptors.iter().map(|i| i.name.clone()).collect();
    if let Some(previous) = previous {
        names.extend(previous.interceptors.iter().map(|i| i.name.clone()));
    }
    names.sort();
    names.dedup();
    router.replace_interceptors(&names, entries);

    tracing::info!(
        routes = summary.routes,
        interceptors = summary.interceptors,
        errors = summary.errors.len(),
        "Manifest applied"
    );
    summary
}
