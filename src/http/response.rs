//! Mapping of dispatch failures to client responses.
//!
//! - No backend in the group → 503 Service Unavailable
//! - Backend unreachable or unusable → 502 Bad Gateway

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::load_balancer::DispatchError;

impl DispatchError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::NoBackends => StatusCode::SERVICE_UNAVAILABLE,
            DispatchError::InvalidUri(_) | DispatchError::Upstream { .. } => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let body = match &self {
            DispatchError::NoBackends => "No backends available",
            DispatchError::InvalidUri(_) | DispatchError::Upstream { .. } => {
                "Upstream request failed"
            }
        };
        (self.status_code(), body).into_response()
    }
}
