//! HTTP server setup and the dispatch handler.
//!
//! # Responsibilities
//! - Create Axum Router with the dispatch handler
//! - Wire up middleware (admission, tracing, timeout, request ID)
//! - Resolve the target service and forward through its client group

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{uri::PathAndQuery, Request, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::gateway::GatewayRuntime;
use crate::lifecycle::shutdown::notified;
use crate::observability::metrics;
use crate::security::rate_limit::{admission_middleware, Admission, RateLimiter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<GatewayRuntime>,
}

/// HTTP server for the gateway's dispatch path.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a server reading from `runtime`, with admission control as
    /// configured.
    pub fn new(config: &GatewayConfig, runtime: Arc<GatewayRuntime>) -> Self {
        let admission = if config.rate_limit.enabled {
            NonZeroU32::new(config.rate_limit.requests_per_second).map(|rate| Admission {
                limiter: Arc::new(RateLimiter::new(rate)),
                max_wait: config.rate_limit.max_wait_ms.map(Duration::from_millis),
            })
        } else {
            None
        };

        Self::with_admission(
            runtime,
            admission,
            Duration::from_secs(config.listener.request_timeout_secs),
        )
    }

    pub fn with_admission(
        runtime: Arc<GatewayRuntime>,
        admission: Option<Admission>,
        request_timeout: Duration,
    ) -> Self {
        let state = AppState { runtime };
        Self {
            router: Self::build_router(state, admission, request_timeout),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(
        state: AppState,
        admission: Option<Admission>,
        request_timeout: Duration,
    ) -> Router {
        let mut router = Router::new()
            .route("/{service}", any(dispatch_handler))
            .route("/{service}/{*path}", any(dispatch_handler))
            .with_state(state);

        if let Some(admission) = admission {
            router =
                router.layer(middleware::from_fn_with_state(admission, admission_middleware));
        }

        router
            .layer(TimeoutLayer::new(request_timeout))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(notified(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Metrics label for requests naming a service the pool does not know.
const UNKNOWN_SERVICE: &str = "unknown";

/// Split `/{service}/rest?query` into the service name and `/rest?query`.
fn split_service(uri: &Uri) -> Option<(String, PathAndQuery)> {
    let path = uri.path().strip_prefix('/')?;
    let (service, rest) = match path.find('/') {
        Some(i) => (&path[..i], &path[i..]),
        None => (path, "/"),
    };
    if service.is_empty() {
        return None;
    }

    let forwarded = match uri.query() {
        Some(q) => format!("{rest}?{q}"),
        None => rest.to_string(),
    };
    let forwarded = PathAndQuery::try_from(forwarded).ok()?;
    Some((service.to_string(), forwarded))
}

/// Main dispatch handler.
/// Looks up the service's client group and forwards the request.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let Some((service, forwarded)) = split_service(request.uri()) else {
        return (StatusCode::NOT_FOUND, "No service in path").into_response();
    };

    let Some(group) = state.runtime.pool().get(&service) else {
        tracing::warn!(service = %service, "Unknown service");
        // Path-derived names are unbounded; keep one series.
        metrics::record_request(UNKNOWN_SERVICE, StatusCode::NOT_FOUND.as_u16());
        return (StatusCode::NOT_FOUND, "Unknown service").into_response();
    };

    tracing::debug!(
        service = %service,
        method = %request.method(),
        path = %forwarded,
        backends = group.len(),
        "Dispatching request"
    );

    let (mut parts, body) = request.into_parts();
    parts.uri = Uri::from(forwarded);

    match group.dispatch(Request::from_parts(parts, body)).await {
        Ok(response) => {
            metrics::record_request(&service, response.status().as_u16());
            response
        }
        Err(e) => {
            tracing::error!(service = %service, error = %e, "Dispatch failed");
            metrics::record_request(&service, e.status_code().as_u16());
            e.into_response()
        }
    }
}
