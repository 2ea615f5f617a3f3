//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Router / InterceptorChain produce:
//!     → logging.rs (structured log events, one span per navigation)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout via tracing-subscriber
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - The library only emits; the binary decides where output goes
//! - Request ID is recorded on the navigation span, so every event inside
//!   the chain carries it
//! - Metrics are cheap when no recorder is installed

pub mod logging;
pub mod metrics;
