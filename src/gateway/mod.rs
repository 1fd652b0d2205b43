//! Gateway control plane.
//!
//! # Data Flow
//! ```text
//! Scheduler tick
//!     → GatewayRuntime::refresh(source)
//!         → DiscoverySource::query_all()      (error: abort, state untouched)
//!         → empty answer                       (no-op)
//!         → registry::build_snapshot
//!         → registry::reconcile(store)
//!         → ClientPool::reconcile(store)
//!     → RefreshReport (logged, metered, kept for the admin API)
//! ```
//!
//! # Design Decisions
//! - All mutable gateway state lives in one owned `GatewayRuntime`
//! - One refresh at a time, enforced by an internal async mutex
//! - Readers never take that mutex

pub mod refresh;
pub mod runtime;

pub use refresh::{RefreshError, RefreshOutcome, RefreshReport};
pub use runtime::GatewayRuntime;
