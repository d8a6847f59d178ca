//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → HTTP server stops accepting, drains in-flight requests
//!             → queue senders dropped with the router
//!             → background worker runs what is left → exit
//! ```
//!
//! # Design Decisions
//! - One broadcast channel fans the shutdown event out to every task
//! - Listeners stop first so no new work is queued while draining

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
