//! HTTP dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Client request  /{service}/{*path}
//!     → server.rs (request id, trace, timeout)
//!     → security::rate_limit (admission, may wait for a token)
//!     → ClientPool::get(service)
//!     → ClientGroup::dispatch (path with the service prefix removed)
//!     → response.rs (dispatch errors → 502/503)
//! ```

pub mod response;
pub mod server;

pub use server::{AppState, HttpServer};
