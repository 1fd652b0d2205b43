//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Build runtime → Spawn scheduler → Start servers
//!
//! Scheduler (scheduler.rs):
//!     interval tick → GatewayRuntime::refresh
//!
//! Shutdown (shutdown.rs):
//!     SIGTERM/SIGINT → broadcast → scheduler and servers exit
//! ```

pub mod scheduler;
pub mod shutdown;

pub use scheduler::RefreshScheduler;
pub use shutdown::Shutdown;
