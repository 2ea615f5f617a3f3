//! Route manifest subsystem.
//!
//! # Data Flow
//! ```text
//! manifest file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RouterConfig (validated, immutable)
//!     → Router::register_source / watcher::apply_config
//!
//! On change:
//!     watcher.rs detects change
//!     → loader.rs loads new manifest
//!     → validation.rs validates
//!     → apply_config moves the live router to it
//! ```
//!
//! # Design Decisions
//! - A manifest is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal manifests
//! - Validation separates syntactic (serde) from semantic checks
//! - An invalid reload is logged and dropped; the router keeps running

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{GuardKind, InterceptorConfig, ObservabilityConfig, RouteConfig, RouterConfig, RouterSettings};
pub use validation::{validate_config, ValidationError};
pub use watcher::{apply_config, ConfigWatcher};
