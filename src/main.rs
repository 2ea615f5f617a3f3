//! Waypoint CLI.
//!
//! Loads a route manifest into a router whose executor only logs, so a
//! manifest can be checked and exercised without the application that
//! will eventually embed it.
//!
//! ```text
//!  manifest.toml ──▶ config::load_config ──▶ Router::register_source
//!                                                  │
//!  path + params ──▶ Router::navigate ──▶ interceptor chain ──▶ resolve ──▶ LogExecutor
//!                                                  │
//!                                                  └──▶ fallback policy (logs)
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};

use waypoint::config::{self, ConfigWatcher, RouterConfig};
use waypoint::navigation::{LogExecutor, NavigationParams, Router};
use waypoint::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "waypoint")]
#[command(about = "Route manifest checker and navigation simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a manifest and list its routes and interceptors
    Check { manifest: PathBuf },
    /// Navigate to a path using a manifest
    Navigate {
        manifest: PathBuf,
        path: String,
        /// Navigation parameters as a JSON object
        #[arg(short, long, default_value = "{}")]
        params: String,
    },
    /// Apply a manifest and keep it applied as the file changes
    Watch { manifest: PathBuf },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { manifest } => {
            let config = load(&manifest)?;
            let router = build_router(&config);
            print_summary(&router);
        }
        Commands::Navigate { manifest, path, params } => {
            let config = load(&manifest)?;
            let params: NavigationParams = serde_json::from_str(&params)?;
            let router = build_router(&config);

            let report = router.navigate(&path, params).await;
            println!("outcome:  {}", report.outcome);
            if let Some(route) = &report.resolved_route {
                println!("target:   {}", route.target);
            }
            if let Some(diagnostic) = &report.diagnostic {
                println!("cause:    {}", diagnostic);
            }
            println!("chain:    [{}]", report.chain.join(", "));
            println!("elapsed:  {:?}", report.elapsed);
        }
        Commands::Watch { manifest } => {
            let mut current = load(&manifest)?;
            let router = Arc::new(build_router(&current));
            print_summary(&router);

            let (watcher, mut updates) = ConfigWatcher::new(&manifest);
            let _watcher = watcher.run()?;

            loop {
                tokio::select! {
                    Some(next) = updates.recv() => {
                        config::apply_config(&router, Some(&current), &next);
                        current = next;
                        print_summary(&router);
                    }
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Shutdown signal received");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

fn load(manifest: &Path) -> Result<RouterConfig, config::ConfigError> {
    let config = config::load_config(manifest)?;
    logging::init(Some(&config.observability.log_level));

    tracing::info!(
        manifest = %manifest.display(),
        routes = config.routes.len(),
        interceptors = config.interceptors.len(),
        "Manifest loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }
    Ok(config)
}

fn build_router(config: &RouterConfig) -> Router {
    let router = Router::with_settings(LogExecutor, config.router.clone());
    router.set_fallback_policy(|original: &str, fallback: &str, _: &NavigationParams| {
        tracing::warn!(original_path = %original, fallback_path = %fallback, "Fallback requested");
        false
    });
    config::apply_config(&router, None, config);
    router
}

fn print_summary(router: &Router) {
    println!("routes:");
    for route in router.all_routes() {
        let kind = if route.is_pattern { "pattern" } else { "exact" };
        let state = if route.enabled { "" } else { " (disabled)" };
        println!("  {:<32} -> {} [{}]{}", route.path, route.target, kind, state);
    }
    println!("interceptors:");
    for entry in router.interceptors() {
        let scope = if entry.global {
            "global".to_string()
        } else {
            entry.patterns().join(", ")
        };
        println!("  {:<20} priority={:<5} {}", entry.name, entry.priority, scope);
    }
}
