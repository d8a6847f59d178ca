//! Front API gateway library.

pub mod backend;
pub mod background;
pub mod cache;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod upload;

pub use config::GatewayConfig;
pub use http::{Backends, HttpServer};
pub use lifecycle::Shutdown;
