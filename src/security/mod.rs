//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (take one token, waiting if none is left)
//!     → Pass to dispatch
//! ```
//!
//! # Design Decisions
//! - One process-wide bucket; capacity equals the configured rate
//! - Waiting callers sleep, they do not poll
//! - Optional wait bound turns a long wait into 429

pub mod rate_limit;
