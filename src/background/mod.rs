//! Best-effort background work.
//!
//! # Data Flow
//! ```text
//! handler → TaskQueue::dispatch (try_send, never blocks)
//!     full queue → task dropped, warning + counter
//!     → bounded mpsc channel
//!     → TaskWorker::run (one task at a time)
//!         → Ok  → counter
//!         → Err → warning + counter
//! ```
//!
//! # Design Decisions
//! - Side effects (view counts, engagement feedback) never delay or fail
//!   the request that triggered them
//! - The server's worker lives until the last `TaskQueue` clone is dropped,
//!   so handlers finishing during graceful shutdown can still dispatch

pub mod queue;

pub use queue::{BackgroundTask, TaskQueue, TaskWorker};
