//! Owned gateway state and the refresh cycle.

use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use arc_swap::ArcSwapOption;
use tokio::sync::Mutex;

use crate::config::GatewayConfig;
use crate::discovery::DiscoverySource;
use crate::gateway::refresh::{RefreshError, RefreshOutcome, RefreshReport};
use crate::load_balancer::{ClientPool, ClientSettings};
use crate::observability::metrics;
use crate::registry::{build_snapshot, reconcile, RegistryStore, SnapshotOptions};

/// Registry and client pool, plus the guard that keeps refreshes serial.
#[derive(Debug)]
pub struct GatewayRuntime {
    registry: RegistryStore,
    pool: ClientPool,
    options: SnapshotOptions,
    refresh_lock: Mutex<()>,
    last_refresh: ArcSwapOption<RefreshReport>,
}

impl GatewayRuntime {
    pub fn new(options: SnapshotOptions, settings: ClientSettings) -> Self {
        Self {
            registry: RegistryStore::new(),
            pool: ClientPool::new(settings),
            options,
            refresh_lock: Mutex::new(()),
            last_refresh: ArcSwapOption::empty(),
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        let options = SnapshotOptions {
            dedup_backends: config.pool.dedup_backends,
            retain_empty_services: config.pool.retain_empty_services,
        };
        Self::new(options, ClientSettings::from(&config.pool))
    }

    pub fn registry(&self) -> &RegistryStore {
        &self.registry
    }

    pub fn pool(&self) -> &ClientPool {
        &self.pool
    }

    pub fn options(&self) -> SnapshotOptions {
        self.options
    }

    /// Report of the most recent applied refresh.
    pub fn last_refresh(&self) -> Option<Arc<RefreshReport>> {
        self.last_refresh.load_full()
    }

    /// Run one refresh cycle against `source`.
    ///
    /// Concurrent callers are serialized. If the query fails, the error is
    /// returned and neither the registry nor the pool is touched. An answer
    /// that yields no services at all is skipped the same way as an empty one.
    pub async fn refresh<S: DiscoverySource>(
        &self,
        source: &S,
    ) -> Result<RefreshOutcome, RefreshError> {
        let _guard = self.refresh_lock.lock().await;
        let started = Instant::now();

        let apps = match source.query_all().await {
            Ok(apps) => apps,
            Err(e) => {
                tracing::error!(error = %e, "Discovery query failed, keeping current registry");
                metrics::record_refresh("failed", started.elapsed());
                return Err(e.into());
            }
        };
        tracing::info!(applications = apps.len(), "Discovery query complete");

        if apps.is_empty() {
            tracing::warn!("No services found, skipping refresh");
            metrics::record_refresh("skipped", started.elapsed());
            return Ok(RefreshOutcome::Skipped);
        }

        let snapshot = build_snapshot(&apps, self.options);
        let skipped_instances = snapshot.skipped_instances();
        if skipped_instances > 0 {
            tracing::debug!(skipped_instances, "Ignored instances without a port");
        }

        // Only reachable when empty services are dropped and no instance has a port.
        if snapshot.is_empty() {
            tracing::warn!(
                applications = apps.len(),
                skipped_instances,
                "No reachable instances, skipping refresh"
            );
            metrics::record_refresh("skipped", started.elapsed());
            return Ok(RefreshOutcome::Skipped);
        }

        tracing::info!("Refreshing registry");
        let diff = reconcile(&self.registry, snapshot);

        tracing::info!("Refreshing clients");
        let pool = self.pool.reconcile(&self.registry);

        let duration = started.elapsed();
        tracing::info!(
            created = pool.created,
            changed = pool.changed,
            removed = pool.removed,
            services = self.registry.len(),
            "Refresh complete"
        );
        metrics::record_refresh("applied", duration);
        metrics::record_registry_size(self.registry.len());
        metrics::record_pool_report(&pool);

        let report = RefreshReport {
            applications: apps.len(),
            services: self.registry.len(),
            skipped_instances,
            removed_services: diff.removed,
            added_services: diff.added,
            updated_services: diff.updated,
            pool,
            completed_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            duration_ms: duration.as_millis() as u64,
        };
        self.last_refresh.store(Some(Arc::new(report.clone())));

        Ok(RefreshOutcome::Applied(report))
    }
}

impl Default for GatewayRuntime {
    fn default() -> Self {
        Self::new(SnapshotOptions::default(), ClientSettings::default())
    }
}
