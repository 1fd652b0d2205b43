//! Client pool management.
//!
//! # Responsibilities
//! - Hold the current ClientGroup of every known service
//! - Bring the pool in line with the registry after each refresh
//! - Swap whole groups atomically, never edit one in place

use std::sync::Arc;
use dashmap::DashMap;
use serde::Serialize;

use crate::load_balancer::group::{hosts_changed, ClientGroup, ClientSettings};
use crate::registry::{RegistryStore, ServiceName};

/// Counts produced by one pool reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolReport {
    /// Services that got their first group.
    pub created: usize,
    /// Services whose group was replaced.
    pub changed: usize,
    /// Groups dropped because their service left the registry.
    pub removed: usize,
    /// Groups left untouched.
    pub unchanged: usize,
}

/// Service name → current client group.
#[derive(Debug)]
pub struct ClientPool {
    groups: DashMap<ServiceName, Arc<ClientGroup>>,
    settings: ClientSettings,
}

impl ClientPool {
    pub fn new(settings: ClientSettings) -> Self {
        Self {
            groups: DashMap::new(),
            settings,
        }
    }

    /// Current group for a service.
    pub fn get(&self, name: &str) -> Option<Arc<ClientGroup>> {
        self.groups.get(name).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn entries(&self) -> Vec<(ServiceName, Arc<ClientGroup>)> {
        self.groups
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }

    /// Make the pool hold exactly one up-to-date group per registry entry.
    ///
    /// Must not run concurrently with itself; the refresh cycle serializes
    /// callers.
    pub fn reconcile(&self, registry: &RegistryStore) -> PoolReport {
        let mut report = PoolReport::default();
        let entries = registry.entries();

        for (name, hosts) in &entries {
            match self.get(name) {
                None => {
                    tracing::debug!(
                        service = %name,
                        backends = hosts.len(),
                        "Creating client group"
                    );
                    let group = ClientGroup::build(hosts, &self.settings);
                    self.groups.insert(name.clone(), Arc::new(group));
                    report.created += 1;
                }
                Some(group) if hosts_changed(&group, hosts) => {
                    tracing::debug!(
                        service = %name,
                        old_backends = group.len(),
                        new_backends = hosts.len(),
                        "Service backends changed, replacing client group"
                    );
                    let group = ClientGroup::build(hosts, &self.settings);
                    self.groups.insert(name.clone(), Arc::new(group));
                    report.changed += 1;
                }
                Some(_) => report.unchanged += 1,
            }
        }

        let stale: Vec<ServiceName> = self
            .groups
            .iter()
            .filter(|r| !registry.contains(r.key()))
            .map(|r| r.key().clone())
            .collect();
        for name in stale {
            tracing::debug!(service = %name, "Service gone from registry, dropping client group");
            self.groups.remove(&name);
            report.removed += 1;
        }

        report
    }
}

impl Default for ClientPool {
    fn default() -> Self {
        Self::new(ClientSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::Balanced;

    fn set(registry: &RegistryStore, name: &str, hosts: &[&str]) {
        let hosts: Vec<String> = hosts.iter().map(|s| s.to_string()).collect();
        registry.insert(name.to_string(), Arc::from(hosts));
    }

    #[test]
    fn test_create_then_idempotent() {
        let registry = RegistryStore::new();
        let pool = ClientPool::default();
        set(&registry, "A", &["h1:80", "h2:80"]);

        let report = pool.reconcile(&registry);
        assert_eq!(report, PoolReport { created: 1, ..Default::default() });
        assert_eq!(pool.get("A").unwrap().len(), 2);

        let report = pool.reconcile(&registry);
        assert_eq!(report, PoolReport { unchanged: 1, ..Default::default() });
    }

    #[test]
    fn test_reorder_keeps_same_group_instance() {
        let registry = RegistryStore::new();
        let pool = ClientPool::default();
        set(&registry, "A", &["h1:80", "h2:80"]);
        pool.reconcile(&registry);
        let before = pool.get("A").unwrap();

        set(&registry, "A", &["h2:80", "h1:80"]);
        let report = pool.reconcile(&registry);
        assert_eq!(report.changed, 0);
        assert!(Arc::ptr_eq(&before, &pool.get("A").unwrap()));
    }

    #[test]
    fn test_change_replaces_group_and_old_one_survives() {
        let registry = RegistryStore::new();
        let pool = ClientPool::default();
        set(&registry, "A", &["h1:80", "h2:80"]);
        pool.reconcile(&registry);
        let held = pool.get("A").unwrap();

        set(&registry, "A", &["h1:80"]);
        let report = pool.reconcile(&registry);
        assert_eq!(report.changed, 1);

        let current = pool.get("A").unwrap();
        assert!(!Arc::ptr_eq(&held, &current));
        assert_eq!(current.addresses().collect::<Vec<_>>(), vec!["h1:80"]);
        // A request still holding the old group sees it intact.
        assert_eq!(held.len(), 2);
        assert_eq!(held.backends()[1].address(), "h2:80");
    }

    #[test]
    fn test_removed_services_are_dropped() {
        let registry = RegistryStore::new();
        let pool = ClientPool::default();
        set(&registry, "A", &["h1:80"]);
        set(&registry, "B", &["h2:80"]);
        pool.reconcile(&registry);

        registry.remove("A");
        let report = pool.reconcile(&registry);
        assert_eq!(report.removed, 1);
        assert_eq!(report.unchanged, 1);
        assert!(pool.get("A").is_none());
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_empty_service_gets_empty_group() {
        let registry = RegistryStore::new();
        let pool = ClientPool::default();
        set(&registry, "B", &[]);
        let report = pool.reconcile(&registry);
        assert_eq!(report.created, 1);
        assert!(pool.get("B").unwrap().is_empty());
    }
}
