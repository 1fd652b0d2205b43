//! Service registry subsystem.
//!
//! # Data Flow
//! ```text
//! Vec<Application> (discovery)
//!     → snapshot.rs (host:port strings, drop port-less instances)
//!     → RegistrySnapshot (immutable, one per refresh cycle)
//!     → differ.rs (prune exclusive keys, upsert the rest)
//!     → store.rs (RegistryStore, read by the dispatch path)
//! ```
//!
//! # Design Decisions
//! - Store is a sharded concurrent map; per-key atomic writes, no global lock
//! - Backend lists are `Arc<[String]>` so readers clone a pointer, not a list
//! - A service with no backends stays in the store with an empty list

pub mod differ;
pub mod snapshot;
pub mod store;

pub use differ::{exclusive_keys, reconcile, RegistryDiff};
pub use snapshot::{build_snapshot, RegistrySnapshot, SnapshotOptions};
pub use store::{Backends, RegistryStore};

/// Unique key into the registry.
pub type ServiceName = String;

/// `host:port` of one service instance.
pub type BackendAddress = String;
