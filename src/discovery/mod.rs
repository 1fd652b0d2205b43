//! Service discovery subsystem.
//!
//! # Data Flow
//! ```text
//! Refresh cycle
//!     → DiscoverySource::query_all()
//!         - eureka.rs (GET {eureka_url}/apps)
//!         - static_source.rs (configured list)
//!     → Vec<Application>
//!     → registry::snapshot (build service → addresses map)
//! ```
//!
//! # Design Decisions
//! - Sources only report what exists; they never touch gateway state
//! - A failed query is an error; an empty answer is not
//! - Instances without a reachable port are kept here and dropped by the
//!   snapshot builder

pub mod eureka;
pub mod static_source;

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::config::{DiscoveryConfig, DiscoveryKind};

pub use eureka::EurekaSource;
pub use static_source::StaticSource;

/// One discovered instance of a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub host_name: String,
    /// `None` when the instance reports no reachable port.
    pub port: Option<u16>,
}

impl Instance {
    pub fn new(host_name: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            host_name: host_name.into(),
            port,
        }
    }
}

/// A discovered service together with its instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    pub name: String,
    pub instances: Vec<Instance>,
}

impl Application {
    pub fn new(name: impl Into<String>, instances: Vec<Instance>) -> Self {
        Self {
            name: name.into(),
            instances,
        }
    }
}

/// Errors raised while querying a discovery backend.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Transport-level failure.
    #[error("discovery request failed: {0}")]
    Request(String),

    /// Backend answered with a non-success status.
    #[error("discovery backend returned status {0}")]
    Status(u16),

    /// Response body could not be decoded.
    #[error("malformed discovery response: {0}")]
    Decode(String),

    #[error("discovery query timed out after {0} seconds")]
    Timeout(u64),
}

/// Answers "which service instances exist right now".
pub trait DiscoverySource: Send + Sync {
    /// Query every registered application.
    fn query_all(&self) -> impl Future<Output = Result<Vec<Application>, DiscoveryError>> + Send;
}

/// The source selected by `discovery.source`.
#[derive(Debug, Clone)]
pub enum ConfiguredSource {
    Eureka(EurekaSource),
    Static(StaticSource),
}

impl ConfiguredSource {
    pub fn from_config(config: &DiscoveryConfig) -> Result<Self, DiscoveryError> {
        Ok(match config.source {
            DiscoveryKind::Eureka => ConfiguredSource::Eureka(EurekaSource::new(
                &config.eureka_url,
                Duration::from_secs(config.query_timeout_secs),
            )?),
            DiscoveryKind::Static => {
                ConfiguredSource::Static(StaticSource::from_config(&config.services))
            }
        })
    }
}

impl DiscoverySource for ConfiguredSource {
    async fn query_all(&self) -> Result<Vec<Application>, DiscoveryError> {
        match self {
            ConfiguredSource::Eureka(s) => s.query_all().await,
            ConfiguredSource::Static(s) => s.query_all().await,
        }
    }
}
