//! API gateway control plane.
//!
//! Keeps a local registry of service → backend addresses fed by a discovery
//! source, reconciles a pool of per-service load-balancing client groups
//! against it, and gates request admission with a token bucket.

pub mod admin;
pub mod config;
pub mod discovery;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod registry;
pub mod security;

pub use config::GatewayConfig;
pub use gateway::{GatewayRuntime, RefreshError, RefreshOutcome, RefreshReport};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use security::rate_limit::RateLimiter;
