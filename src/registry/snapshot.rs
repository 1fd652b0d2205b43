//! Snapshot building.
//!
//! Turns a raw discovery answer into service name → backend addresses.

use std::collections::{HashMap, HashSet};

use crate::discovery::Application;
use crate::registry::{BackendAddress, ServiceName};

/// Policy knobs for snapshot building.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotOptions {
    /// Drop repeated addresses within one service, keeping the first.
    pub dedup_backends: bool,
    /// Keep services with zero valid instances as empty entries.
    pub retain_empty_services: bool,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            dedup_backends: false,
            retain_empty_services: true,
        }
    }
}

/// Immutable view of the discovered services for one refresh cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrySnapshot {
    services: HashMap<ServiceName, Vec<BackendAddress>>,
    skipped_instances: usize,
}

impl RegistrySnapshot {
    pub fn get(&self, name: &str) -> Option<&[BackendAddress]> {
        self.services.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn service_names(&self) -> impl Iterator<Item = &ServiceName> {
        self.services.keys()
    }

    /// Instances dropped because they reported no port.
    pub fn skipped_instances(&self) -> usize {
        self.skipped_instances
    }

    pub fn into_services(self) -> HashMap<ServiceName, Vec<BackendAddress>> {
        self.services
    }
}

impl From<HashMap<ServiceName, Vec<BackendAddress>>> for RegistrySnapshot {
    fn from(services: HashMap<ServiceName, Vec<BackendAddress>>) -> Self {
        Self {
            services,
            skipped_instances: 0,
        }
    }
}

/// Build a snapshot from discovered applications.
///
/// Instances without a port are skipped. If the same application name shows
/// up twice, the later one wins.
pub fn build_snapshot(apps: &[Application], options: SnapshotOptions) -> RegistrySnapshot {
    let mut services = HashMap::with_capacity(apps.len());
    let mut skipped_instances = 0;

    for app in apps {
        let mut seen = HashSet::new();
        let mut addrs = Vec::with_capacity(app.instances.len());

        for ins in &app.instances {
            let Some(port) = ins.port else {
                skipped_instances += 1;
                continue;
            };
            let addr = format!("{}:{}", ins.host_name, port);
            if options.dedup_backends && !seen.insert(addr.clone()) {
                continue;
            }
            addrs.push(addr);
        }

        if addrs.is_empty() && !options.retain_empty_services {
            services.remove(&app.name);
            continue;
        }
        services.insert(app.name.clone(), addrs);
    }

    RegistrySnapshot {
        services,
        skipped_instances,
    }
}
