//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for the binary
//! - Pick the log level from the environment or the manifest
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` wins over the configured level

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when neither `RUST_LOG` nor the manifest sets one.
pub const DEFAULT_FILTER: &str = "waypoint=info";

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init(level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        level
            .map(|level| format!("waypoint={level}"))
            .unwrap_or_else(|| DEFAULT_FILTER.to_string())
            .into()
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
