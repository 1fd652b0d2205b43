//! Backend client handles.
//!
//! # Responsibilities
//! - Represent a single backend address with its own pooled HTTP client
//! - Track in-flight requests (for Least Connections LB)
//! - Forward a request to that one backend

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{self, HeaderMap, HeaderName};
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{Request, Response, Uri, Version};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;

use crate::config::BackendProtocol;
use crate::registry::BackendAddress;

/// Errors on the dispatch path.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The group has no backend to pick.
    #[error("no backends available")]
    NoBackends,

    /// The backend address cannot be used as a URI authority.
    #[error("invalid upstream uri: {0}")]
    InvalidUri(String),

    /// Connection or protocol failure talking to the backend.
    #[error("upstream request to {addr} failed: {reason}")]
    Upstream { addr: String, reason: String },
}

/// What every backend client can do, whatever protocol it speaks.
pub trait Balanced: Send + Sync {
    /// The `host:port` this client talks to.
    fn address(&self) -> &str;

    /// Requests currently being forwarded through this client.
    fn in_flight(&self) -> usize;

    /// Forward a request to this backend.
    fn dispatch(
        &self,
        request: Request<Body>,
    ) -> impl Future<Output = Result<Response<Body>, DispatchError>> + Send;
}

/// Client bound to one backend address.
pub struct HostClient {
    addr: BackendAddress,
    authority: Option<Authority>,
    version: Version,
    client: Client<HttpConnector, Body>,
    in_flight: AtomicUsize,
}

impl HostClient {
    fn new(addr: BackendAddress, http2: bool, connect_timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect_timeout));

        let client = Client::builder(TokioExecutor::new())
            .http2_only(http2)
            .build(connector);

        Self {
            authority: addr.parse().ok(),
            addr,
            version: if http2 { Version::HTTP_2 } else { Version::HTTP_11 },
            client,
            in_flight: AtomicUsize::new(0),
        }
    }

    fn upstream_request(&self, request: Request<Body>) -> Result<Request<Body>, DispatchError> {
        let authority = self
            .authority
            .clone()
            .ok_or_else(|| DispatchError::InvalidUri(self.addr.clone()))?;

        let (mut parts, body) = request.into_parts();

        let mut uri_parts = parts.uri.into_parts();
        uri_parts.scheme = Some(Scheme::HTTP);
        uri_parts.authority = Some(authority);
        if uri_parts.path_and_query.is_none() {
            uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
        }
        parts.uri = Uri::from_parts(uri_parts)
            .map_err(|e| DispatchError::InvalidUri(e.to_string()))?;
        parts.version = self.version;
        strip_hop_by_hop(&mut parts.headers);

        Ok(Request::from_parts(parts, body))
    }

    async fn forward(&self, request: Request<Body>) -> Result<Response<Body>, DispatchError> {
        let request = self.upstream_request(request)?;
        let _guard = InFlightGuard::new(&self.in_flight);

        let response = self.client.request(request).await.map_err(|e| DispatchError::Upstream {
            addr: self.addr.clone(),
            reason: e.to_string(),
        })?;

        let (parts, body) = response.into_parts();
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

impl fmt::Debug for HostClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostClient")
            .field("addr", &self.addr)
            .field("version", &self.version)
            .field("in_flight", &self.in_flight.load(Ordering::Relaxed))
            .finish()
    }
}

const HOP_BY_HOP: [HeaderName; 6] = [
    header::CONNECTION,
    header::HOST,
    header::TE,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::PROXY_AUTHORIZATION,
];

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
    headers.remove("keep-alive");
    headers.remove("proxy-connection");
}

/// Decrements the in-flight count on drop.
struct InFlightGuard<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> InFlightGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Self { counter }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::Relaxed);
    }
}

/// A backend client. The set of variants is closed: one per supported
/// upstream protocol.
#[derive(Debug)]
pub enum BackendClient {
    /// HTTP/1.1 with keep-alive pooling.
    Http1(HostClient),
    /// HTTP/2 over cleartext with prior knowledge.
    Http2(HostClient),
}

impl BackendClient {
    /// Build a client for `addr`. No connection is opened until the first
    /// dispatch.
    pub fn new(
        addr: impl Into<BackendAddress>,
        protocol: BackendProtocol,
        connect_timeout: Duration,
    ) -> Self {
        let addr = addr.into();
        match protocol {
            BackendProtocol::Http1 => {
                BackendClient::Http1(HostClient::new(addr, false, connect_timeout))
            }
            BackendProtocol::Http2 => {
                BackendClient::Http2(HostClient::new(addr, true, connect_timeout))
            }
        }
    }

    pub fn protocol(&self) -> BackendProtocol {
        match self {
            BackendClient::Http1(_) => BackendProtocol::Http1,
            BackendClient::Http2(_) => BackendProtocol::Http2,
        }
    }

    fn host(&self) -> &HostClient {
        match self {
            BackendClient::Http1(h) | BackendClient::Http2(h) => h,
        }
    }
}

impl Balanced for BackendClient {
    fn address(&self) -> &str {
        &self.host().addr
    }

    fn in_flight(&self) -> usize {
        self.host().in_flight.load(Ordering::Relaxed)
    }

    fn dispatch(
        &self,
        request: Request<Body>,
    ) -> impl Future<Output = Result<Response<Body>, DispatchError>> + Send {
        self.host().forward(request)
    }
}
