//! Interceptor subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (any module, any time):
//!     InterceptorBuilder
//!     → entry.rs (compile patterns / excludes)
//!     → registry.rs (append, copy-on-write)
//!
//! Per navigation:
//!     registry snapshot
//!     → chain.rs (filter by path, stable sort by priority)
//!     → guard 1 ─ continuation ─▶ guard 2 ─ continuation ─▶ ... ─▶ allow
//!          │ (timeout.rs bounds each guard's own time)
//!          └─ false / timeout / fault ─▶ block, remaining guards skipped
//! ```
//!
//! # Design Decisions
//! - Fail closed: a guard that errors, panics or runs out of time blocks
//! - No registry lock is held while a guard runs
//! - Cancellation reaches guards through a per-step `CancellationToken`

pub mod builtin;
pub mod chain;
pub mod entry;
pub mod registry;
mod timeout;

pub use builtin::{Allow, Deny, RequireParams, RouteRequirements};
pub use chain::{ChainVerdict, Continuation, InterceptorChain};
pub use entry::{guard_fn, FnInterceptor, InterceptContext, Interceptor, InterceptorBuilder, InterceptorEntry};
pub use registry::InterceptorRegistry;
