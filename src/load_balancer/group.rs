//! Client groups: one immutable set of backend clients per service.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};

use crate::config::{BackendProtocol, BalancerKind, PoolConfig};
use crate::load_balancer::{
    backend::{Balanced, BackendClient, DispatchError},
    least_conn::LeastConnections,
    round_robin::RoundRobin,
    LoadBalancer,
};
use crate::registry::BackendAddress;

/// How new backend clients are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientSettings {
    pub protocol: BackendProtocol,
    pub balancer: BalancerKind,
    pub connect_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self::from(&PoolConfig::default())
    }
}

impl From<&PoolConfig> for ClientSettings {
    fn from(config: &PoolConfig) -> Self {
        Self {
            protocol: config.protocol,
            balancer: config.balancer,
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
        }
    }
}

/// Load-balancing set of backend clients for one service.
///
/// Never mutated after construction.
#[derive(Debug)]
pub struct ClientGroup {
    backends: Vec<Arc<BackendClient>>,
    balancer: Box<dyn LoadBalancer>,
}

impl ClientGroup {
    /// One client per address, in the given order.
    pub fn build(hosts: &[BackendAddress], settings: &ClientSettings) -> Self {
        let backends = hosts
            .iter()
            .map(|addr| {
                Arc::new(BackendClient::new(
                    addr.clone(),
                    settings.protocol,
                    settings.connect_timeout,
                ))
            })
            .collect();

        let balancer: Box<dyn LoadBalancer> = match settings.balancer {
            BalancerKind::RoundRobin => Box::new(RoundRobin::new()),
            BalancerKind::LeastConnections => Box::new(LeastConnections::new()),
        };

        Self { backends, balancer }
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    pub fn backends(&self) -> &[Arc<BackendClient>] {
        &self.backends
    }

    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.backends.iter().map(|b| b.address())
    }

    /// Pick a backend according to the group's policy.
    pub fn select(&self) -> Option<Arc<BackendClient>> {
        self.balancer.next_backend(&self.backends)
    }

    /// Forward a request through one of the group's backends.
    pub async fn dispatch(&self, request: Request<Body>) -> Result<Response<Body>, DispatchError> {
        let backend = self.select().ok_or(DispatchError::NoBackends)?;
        backend.dispatch(request).await
    }
}

/// Whether `group` must be rebuilt to serve `hosts`.
///
/// Unchanged means same number of backends and the same set of addresses,
/// in any order.
pub fn hosts_changed(group: &ClientGroup, hosts: &[BackendAddress]) -> bool {
    if group.len() != hosts.len() {
        return true;
    }

    let current: HashSet<&str> = group.addresses().collect();
    let wanted: HashSet<&str> = hosts.iter().map(String::as_str).collect();
    current.symmetric_difference(&wanted).next().is_some()
}
