//! Backend call failures.

use thiserror::Error;

/// Failure of a call to one of the backend services.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The service could not be reached or the transfer broke off.
    #[error("{service} unreachable: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("{service} returned {status}: {message}")]
    Status {
        service: &'static str,
        status: u16,
        message: String,
    },

    /// The service answered with a body that could not be decoded.
    #[error("{service} sent an undecodable response: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },

    /// The requested entity does not exist.
    #[error("{service}: {what} not found")]
    NotFound {
        service: &'static str,
        what: String,
    },

    /// An outbound stream ended before the call completed.
    #[error("{service} closed the stream: {message}")]
    StreamClosed {
        service: &'static str,
        message: String,
    },
}

impl BackendError {
    pub fn service(&self) -> &'static str {
        match self {
            BackendError::Transport { service, .. }
            | BackendError::Status { service, .. }
            | BackendError::Decode { service, .. }
            | BackendError::NotFound { service, .. }
            | BackendError::StreamClosed { service, .. } => service,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::NotFound { .. })
            || matches!(self, BackendError::Status { status: 404, .. })
    }

    /// The service refused the caller's credentials.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, BackendError::Status { status: 401 | 403, .. })
    }
}
