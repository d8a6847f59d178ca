//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! handlers, cache, upload bridge, background worker
//!     → logging.rs (tracing subscriber: pretty or JSON lines on stdout)
//!     → metrics.rs (metrics facade → Prometheus exporter)
//! ```
//!
//! # Design Decisions
//! - Every request span carries its `x-request-id`
//! - Recording a metric never fails or blocks a request

pub mod logging;
pub mod metrics;
