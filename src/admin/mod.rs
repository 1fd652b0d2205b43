//! Read-only admin API over the live registry and client pool.

pub mod auth;
pub mod handlers;

use std::sync::Arc;
use axum::{middleware, routing::get, Router};

use crate::gateway::GatewayRuntime;
use crate::http::server::AppState;
use self::auth::admin_auth_middleware;
use self::handlers::*;

pub fn setup_admin_router(runtime: Arc<GatewayRuntime>, api_key: &str) -> Router {
    let api_key: Arc<str> = Arc::from(api_key);
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/services", get(get_services))
        .route("/admin/pool", get(get_pool))
        .route("/admin/refresh", get(get_refresh))
        .layer(middleware::from_fn_with_state(api_key, admin_auth_middleware))
        .with_state(AppState { runtime })
}
