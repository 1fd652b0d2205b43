//! Periodic refresh scheduling.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::discovery::DiscoverySource;
use crate::gateway::GatewayRuntime;

/// Drives refresh cycles on a fixed interval until shutdown.
pub struct RefreshScheduler<S> {
    runtime: Arc<GatewayRuntime>,
    source: S,
    interval: Duration,
}

impl<S: DiscoverySource> RefreshScheduler<S> {
    pub fn new(runtime: Arc<GatewayRuntime>, source: S, interval: Duration) -> Self {
        Self {
            runtime,
            source,
            interval,
        }
    }

    /// Refresh immediately, then every `interval`. A failed cycle is logged
    /// and the next tick tries again.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Refresh scheduler starting");

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.runtime.refresh(&self.source).await {
                        tracing::warn!(error = %e, "Refresh cycle aborted");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Refresh scheduler received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{Application, Instance, StaticSource};
    use crate::lifecycle::Shutdown;

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_is_immediate_and_shutdown_stops_loop() {
        let runtime = Arc::new(GatewayRuntime::default());
        let source =
            StaticSource::new(vec![Application::new("A", vec![Instance::new("h", Some(1))])]);
        let shutdown = Shutdown::new();

        let scheduler = RefreshScheduler::new(runtime.clone(), source, Duration::from_secs(30));
        let handle = tokio::spawn(scheduler.run(shutdown.subscribe()));

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(runtime.registry().contains("A"));

        shutdown.trigger();
        handle.await.unwrap();
    }
}
