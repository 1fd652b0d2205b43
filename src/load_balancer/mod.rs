//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! RegistryStore (post-reconciliation)
//!     → pool.rs (compare each service's hosts with its ClientGroup)
//!         - unchanged: keep the group
//!         - new / changed: group.rs builds a fresh ClientGroup, swapped in
//!
//! Dispatch path:
//!     ClientPool::get(service) → Arc<ClientGroup>
//!     → Apply load balancing algorithm:
//!         - round_robin.rs (rotate through backends)
//!         - least_conn.rs (pick backend with fewest in-flight requests)
//!     → backend.rs (forward through that backend's client)
//! ```
//!
//! # Design Decisions
//! - A ClientGroup is immutable; changes replace the whole group
//! - In-flight requests keep the old group alive through their Arc
//! - Change detection is set-based, order of hosts never matters
//! - Selection policy only picks among existing backends; which backends
//!   exist is decided by the refresh cycle alone

pub mod backend;
pub mod group;
pub mod least_conn;
pub mod pool;
pub mod round_robin;

use std::sync::Arc;

pub use backend::{Balanced, BackendClient, DispatchError, HostClient};
pub use group::{hosts_changed, ClientGroup, ClientSettings};
pub use pool::{ClientPool, PoolReport};

/// Per-request backend selection policy.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    /// Pick the backend for the next request, `None` when there is none.
    fn next_backend(&self, backends: &[Arc<BackendClient>]) -> Option<Arc<BackendClient>>;
}
