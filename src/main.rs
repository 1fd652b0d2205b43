//! Service gateway.
//!
//! ```text
//!   Discovery (Eureka / static)
//!          │  periodic refresh
//!          ▼
//!   ┌──────────────────────────────────────────────┐
//!   │ GatewayRuntime                               │
//!   │   RegistryStore  ──reconcile──▶  ClientPool  │
//!   └──────────────────────────────────────────────┘
//!          ▲                              │
//!          │ admin API (read-only)        │ ClientGroup::dispatch
//!                                         ▼
//!   Client ──▶ HttpServer ──▶ RateLimiter ──▶ backend
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use service_gateway::admin::setup_admin_router;
use service_gateway::config::{load_config, GatewayConfig};
use service_gateway::discovery::ConfiguredSource;
use service_gateway::lifecycle::shutdown::notified;
use service_gateway::lifecycle::{RefreshScheduler, Shutdown};
use service_gateway::observability::{logging, metrics};
use service_gateway::{GatewayRuntime, HttpServer};

#[derive(Parser)]
#[command(name = "service-gateway")]
#[command(about = "API gateway with service discovery and admission control", long_about = None)]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!("service-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        discovery = ?config.discovery.source,
        refresh_interval_secs = config.discovery.refresh_interval_secs,
        rate_limit_rps = config.rate_limit.requests_per_second,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let runtime = Arc::new(GatewayRuntime::from_config(&config));

    let source = ConfiguredSource::from_config(&config.discovery)?;
    let scheduler = RefreshScheduler::new(
        runtime.clone(),
        source,
        Duration::from_secs(config.discovery.refresh_interval_secs),
    );
    let scheduler_task = tokio::spawn(scheduler.run(shutdown.subscribe()));

    if config.admin.enabled {
        let admin = setup_admin_router(runtime.clone(), &config.admin.api_key);
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        tracing::info!(address = %listener.local_addr()?, "Admin API listening");
        let admin_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, admin)
                .with_graceful_shutdown(notified(admin_shutdown))
                .await
            {
                tracing::error!(error = %e, "Admin server failed");
            }
        });
    }

    tokio::spawn(shutdown.clone().trigger_on_signal());

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(&config, runtime);
    server.run(listener, shutdown.subscribe()).await?;

    shutdown.trigger();
    let _ = scheduler_task.await;

    tracing::info!("Shutdown complete");
    Ok(())
}
