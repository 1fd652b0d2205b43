//! Refresh cycle types.

use serde::Serialize;
use thiserror::Error;

use crate::discovery::DiscoveryError;
use crate::load_balancer::PoolReport;

/// Errors that abort a refresh cycle. Gateway state is untouched when one
/// is returned.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("discovery query failed: {0}")]
    Discovery(#[from] DiscoveryError),
}

/// Summary of an applied refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    /// Applications returned by discovery.
    pub applications: usize,
    /// Services in the registry after the cycle.
    pub services: usize,
    /// Instances dropped for lacking a port.
    pub skipped_instances: usize,
    /// Services pruned from the registry.
    pub removed_services: Vec<String>,
    pub added_services: usize,
    pub updated_services: usize,
    pub pool: PoolReport,
    /// Seconds since the Unix epoch.
    pub completed_at: u64,
    pub duration_ms: u64,
}

/// What a refresh call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The new snapshot was applied.
    Applied(RefreshReport),
    /// Discovery yielded no services; nothing was changed.
    Skipped,
}

impl RefreshOutcome {
    pub fn report(&self) -> Option<&RefreshReport> {
        match self {
            RefreshOutcome::Applied(r) => Some(r),
            RefreshOutcome::Skipped => None,
        }
    }
}
