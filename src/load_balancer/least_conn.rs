//! Least Connections load balancing strategy.

use std::sync::Arc;
use crate::load_balancer::{Balanced, LoadBalancer, backend::BackendClient};

/// Least connections selector.
/// Selects the backend with the fewest in-flight requests.
#[derive(Debug, Default)]
pub struct LeastConnections;

impl LeastConnections {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for LeastConnections {
    fn next_backend(&self, backends: &[Arc<BackendClient>]) -> Option<Arc<BackendClient>> {
        // On a tie the first one wins
        backends.iter().min_by_key(|b| b.in_flight()).cloned()
    }
}
