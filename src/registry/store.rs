//! Live service registry.

use std::collections::HashMap;
use std::sync::Arc;
use dashmap::DashMap;

use crate::registry::{BackendAddress, ServiceName};

/// Backend list shared between the store and its readers.
pub type Backends = Arc<[BackendAddress]>;

/// Concurrently readable map of service name → backend addresses.
///
/// Writes are atomic per key. Readers never block on a refresh for longer
/// than a single shard write, and always see a complete list for a key.
#[derive(Debug, Clone, Default)]
pub struct RegistryStore {
    inner: Arc<DashMap<ServiceName, Backends>>,
}

impl RegistryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current backends for a service. `Some(empty)` means the service is
    /// known but has no reachable instance.
    pub fn get(&self, name: &str) -> Option<Backends> {
        self.inner.get(name).map(|r| r.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    /// Insert or overwrite, returning the previous list.
    pub fn insert(&self, name: ServiceName, backends: Backends) -> Option<Backends> {
        self.inner.insert(name, backends)
    }

    pub fn remove(&self, name: &str) -> Option<Backends> {
        self.inner.remove(name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn service_names(&self) -> Vec<ServiceName> {
        self.inner.iter().map(|r| r.key().clone()).collect()
    }

    /// Copy out every entry so callers can iterate without holding shard locks.
    pub fn entries(&self) -> Vec<(ServiceName, Backends)> {
        self.inner
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }

    pub fn to_map(&self) -> HashMap<ServiceName, Vec<BackendAddress>> {
        self.inner
            .iter()
            .map(|r| (r.key().clone(), r.value().to_vec()))
            .collect()
    }
}
