//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and URLs
//! - Validate value ranges (intervals > 0, ports valid)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::{DiscoveryKind, GatewayConfig};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("discovery.eureka_url: {0}")]
    InvalidEurekaUrl(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("discovery.services: duplicate service '{0}'")]
    DuplicateService(String),

    #[error("discovery.services: '{service}' has port {port} out of range")]
    PortOutOfRange { service: String, port: u32 },

    #[error("admin.api_key must be set when the admin API is enabled")]
    MissingAdminKey,
}

/// Check a configuration for semantic errors.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_addr(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }
    if config.admin.enabled {
        check_addr(&mut errors, "admin.bind_address", &config.admin.bind_address);
        if config.admin.api_key.trim().is_empty() {
            errors.push(ValidationError::MissingAdminKey);
        }
    }

    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero("listener.request_timeout_secs"));
    }
    if config.discovery.refresh_interval_secs == 0 {
        errors.push(ValidationError::Zero("discovery.refresh_interval_secs"));
    }
    if config.discovery.query_timeout_secs == 0 {
        errors.push(ValidationError::Zero("discovery.query_timeout_secs"));
    }
    if config.rate_limit.enabled && config.rate_limit.requests_per_second == 0 {
        errors.push(ValidationError::Zero("rate_limit.requests_per_second"));
    }

    match config.discovery.source {
        DiscoveryKind::Eureka => match Url::parse(&config.discovery.eureka_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => errors.push(ValidationError::InvalidEurekaUrl(format!(
                "unsupported scheme '{}'",
                url.scheme()
            ))),
            Err(e) => errors.push(ValidationError::InvalidEurekaUrl(e.to_string())),
        },
        DiscoveryKind::Static => {
            let mut seen = HashSet::new();
            for svc in &config.discovery.services {
                if !seen.insert(svc.name.as_str()) {
                    errors.push(ValidationError::DuplicateService(svc.name.clone()));
                }
                for port in svc.instances.iter().filter_map(|i| i.port) {
                    if port == 0 || port > u16::MAX as u32 {
                        errors.push(ValidationError::PortOutOfRange {
                            service: svc.name.clone(),
                            port,
                        });
                    }
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
