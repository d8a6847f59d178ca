//! HTTP surface of the gateway.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, routes)
//!     → request.rs (request ID, session cookie)
//!     → params.rs (normalize + validate query/path parameters)
//!     → videos.rs / users.rs / upload.rs (handlers)
//!         → cache (listing, detail) → backend clients
//!         → session.rs (profile for upload, comments, recommendations)
//!     → views.rs (client-facing JSON shapes)
//!     → response.rs (errors → status codes, cached bodies)
//!     → Send to client
//! ```

pub mod params;
pub mod request;
pub mod response;
pub mod server;
pub mod session;
pub mod upload;
pub mod users;
pub mod videos;
pub mod views;

pub use request::{MakeRequestUuid, SESSION_COOKIE, X_REQUEST_ID};
pub use response::GatewayError;
pub use server::{AppState, Backends, HttpServer, StartupError};
