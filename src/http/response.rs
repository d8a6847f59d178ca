//! Response shaping and error mapping.
//!
//! # Responsibilities
//! - Map gateway failures to HTTP status codes with a JSON `{"error"}` body
//! - Serve cached JSON bodies verbatim, tagged with `x-cache`
//!
//! # Design Decisions
//! - Parameter errors are rejected before any backend is contacted (400)
//! - Backend failures surface as 502; a backend "not found" stays 404
//! - Cache failures never appear here; the cache absorbs them

use axum::extract::multipart::MultipartError;
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::backend::BackendError;
use crate::cache::CachedBody;
use crate::upload::UploadError;

pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// Everything a handler can fail with.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid parameter `{name}`: {message}")]
    MalformedParameter { name: &'static str, message: String },

    #[error("a valid session is required")]
    Unauthorized,

    #[error(transparent)]
    Upstream(#[from] BackendError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("failed to encode response: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),
}

impl GatewayError {
    pub fn malformed(name: &'static str, message: impl Into<String>) -> Self {
        GatewayError::MalformedParameter {
            name,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::MalformedParameter { .. } => StatusCode::BAD_REQUEST,
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::Upstream(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            GatewayError::Upstream(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Upload(UploadError::Source { .. }) => StatusCode::BAD_REQUEST,
            GatewayError::Upload(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Multipart(e) => e.status(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl IntoResponse for CachedBody {
    fn into_response(self) -> Response {
        (
            [
                (
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                ),
                (X_CACHE, HeaderValue::from_static(self.status.as_str())),
            ],
            self.body,
        )
            .into_response()
    }
}
