//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration for the dispatch server.
    pub listener: ListenerConfig,

    /// Service discovery settings.
    pub discovery: DiscoveryConfig,

    /// Client pool policy.
    pub pool: PoolConfig,

    /// Admission control.
    pub rate_limit: RateLimitConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Which discovery backend answers `query_all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryKind {
    /// Eureka REST API.
    Eureka,
    /// Fixed list from `discovery.services`.
    Static,
}

/// Service discovery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub source: DiscoveryKind,

    /// Eureka base URL, e.g. "http://127.0.0.1:8761/eureka".
    pub eureka_url: String,

    /// Upper bound on a single discovery query in seconds.
    pub query_timeout_secs: u64,

    /// Interval between refresh cycles in seconds.
    pub refresh_interval_secs: u64,

    /// Services served by the static source.
    pub services: Vec<StaticServiceConfig>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            source: DiscoveryKind::Eureka,
            eureka_url: "http://127.0.0.1:8761/eureka".to_string(),
            query_timeout_secs: 5,
            refresh_interval_secs: 30,
            services: Vec::new(),
        }
    }
}

/// A statically configured service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StaticServiceConfig {
    pub name: String,

    #[serde(default)]
    pub instances: Vec<StaticInstanceConfig>,
}

/// A statically configured instance. `port` may be omitted to model an
/// instance without a reachable port.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StaticInstanceConfig {
    pub host: String,

    #[serde(default)]
    pub port: Option<u32>,
}

/// Protocol spoken to backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendProtocol {
    #[default]
    Http1,
    /// HTTP/2 with prior knowledge (cleartext).
    Http2,
}

/// Per-request backend selection policy inside a client group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BalancerKind {
    #[default]
    RoundRobin,
    LeastConnections,
}

/// Client pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Drop duplicate backend addresses within one service.
    pub dedup_backends: bool,

    /// Keep services whose instances all lack a port, with an empty backend list.
    /// When `false` such services are pruned; a refresh in which every service
    /// would be pruned is skipped instead.
    pub retain_empty_services: bool,

    pub protocol: BackendProtocol,

    pub balancer: BalancerKind,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            dedup_backends: false,
            retain_empty_services: true,
            protocol: BackendProtocol::Http1,
            balancer: BalancerKind::RoundRobin,
            connect_timeout_secs: 5,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable admission control.
    pub enabled: bool,

    /// Token bucket capacity and refill rate.
    pub requests_per_second: u32,

    /// Give up waiting for a token after this many milliseconds (429).
    /// Unset means callers wait as long as it takes.
    pub max_wait_ms: Option<u64>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_second: 1000,
            max_wait_ms: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: GatewayConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.discovery.source, DiscoveryKind::Eureka);
        assert!(!config.pool.dedup_backends);
        assert!(config.pool.retain_empty_services);
        assert_eq!(config.rate_limit.requests_per_second, 1000);
        assert!(config.rate_limit.max_wait_ms.is_none());
    }

    #[test]
    fn test_static_services_parse() {
        let raw = r#"
            [discovery]
            source = "static"

            [[discovery.services]]
            name = "orders"
            instances = [{ host = "10.0.0.1", port = 8080 }, { host = "10.0.0.2" }]

            [pool]
            protocol = "http2"
            balancer = "least_connections"
        "#;
        let config: GatewayConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.discovery.source, DiscoveryKind::Static);
        let svc = &config.discovery.services[0];
        assert_eq!(svc.name, "orders");
        assert_eq!(svc.instances[0].port, Some(8080));
        assert_eq!(svc.instances[1].port, None);
        assert_eq!(config.pool.protocol, BackendProtocol::Http2);
        assert_eq!(config.pool.balancer, BalancerKind::LeastConnections);
    }
}
